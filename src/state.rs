//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::{
    AgentDirectory, HotelDirectory, InMemoryStore, PgDirectory, PgRouteRepository, PgServiceRepository,
    RouteRepository, ServiceRepository,
};
use crate::services::{
    KeywordClassifier, RouteExecutionService, RoutePlanningService, ServiceWorkflowService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub planning: Arc<RoutePlanningService>,
    pub execution: Arc<RouteExecutionService>,
    pub workflow: Arc<ServiceWorkflowService>,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        services: Arc<dyn ServiceRepository>,
        routes: Arc<dyn RouteRepository>,
        hotels: Arc<dyn HotelDirectory>,
        agents: Arc<dyn AgentDirectory>,
    ) -> Self {
        let planning = Arc::new(RoutePlanningService::new(
            services.clone(),
            routes.clone(),
            hotels.clone(),
            agents.clone(),
            config.planning.clone(),
        ));
        let execution = Arc::new(RouteExecutionService::new(services.clone(), routes));
        let workflow = Arc::new(ServiceWorkflowService::new(
            services,
            hotels,
            agents,
            Arc::new(KeywordClassifier),
            execution.clone(),
        ));

        Self {
            config,
            planning,
            execution,
            workflow,
        }
    }

    /// Estado respaldado por el almacén en memoria
    pub fn in_memory(config: EnvironmentConfig, store: Arc<InMemoryStore>) -> Self {
        Self::new(config, store.clone(), store.clone(), store.clone(), store)
    }

    /// Estado respaldado por PostgreSQL
    pub fn postgres(config: EnvironmentConfig, pool: PgPool) -> Self {
        let directory = Arc::new(PgDirectory::new(pool.clone()));
        Self::new(
            config,
            Arc::new(PgServiceRepository::new(pool.clone())),
            Arc::new(PgRouteRepository::new(pool)),
            directory.clone(),
            directory,
        )
    }
}
