//! Servicio de planificación de rutas
//!
//! Carga los datos de los colaboradores, invoca al constructor de rutas y
//! persiste el resultado. La comprobación de rutas existentes y la creación
//! ocurren dentro de la misma sección de escritor único por fecha.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::PlanningConfig;
use crate::models::{Hotel, Route, RouteFilter, RouteStatus, ServiceFilter, ServiceStatus};
use crate::repositories::{AgentDirectory, HotelDirectory, RouteRepository, ServiceRepository};
use crate::services::route_builder::{BuildResult, DataIntegrityWarning, PlanningInput, RouteBuilder};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::locks::KeyedLocks;

/// Estados que pueden aparecer en una ruta
const PLANNABLE_STATUSES: [ServiceStatus; 4] = [
    ServiceStatus::PendingPickup,
    ServiceStatus::ReadyForDelivery,
    ServiceStatus::PartialDelivery,
    ServiceStatus::Completed,
];

/// Resultado de una generación de rutas
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PlanningOutcome {
    Planned {
        routes: Vec<Route>,
        warnings: Vec<DataIntegrityWarning>,
        covered_agents: Vec<Uuid>,
    },
    /// Nada que planificar para la fecha
    NoEligibleWork { warnings: Vec<DataIntegrityWarning> },
}

pub struct RoutePlanningService {
    services: Arc<dyn ServiceRepository>,
    routes: Arc<dyn RouteRepository>,
    hotels: Arc<dyn HotelDirectory>,
    agents: Arc<dyn AgentDirectory>,
    builder: RouteBuilder,
    date_locks: KeyedLocks<NaiveDate>,
}

impl RoutePlanningService {
    pub fn new(
        services: Arc<dyn ServiceRepository>,
        routes: Arc<dyn RouteRepository>,
        hotels: Arc<dyn HotelDirectory>,
        agents: Arc<dyn AgentDirectory>,
        config: PlanningConfig,
    ) -> Self {
        Self {
            services,
            routes,
            hotels,
            agents,
            builder: RouteBuilder::new(config),
            date_locks: KeyedLocks::new(),
        }
    }

    /// Genera las rutas de `date` para los repartidores que aún no tienen una activa
    pub async fn generate_routes(&self, date: NaiveDate) -> AppResult<PlanningOutcome> {
        let _guard = self.date_locks.lock(date).await;
        self.generate_locked(date).await
    }

    /// Borra todas las rutas de `date`
    pub async fn clear_routes(&self, date: NaiveDate) -> AppResult<u64> {
        let _guard = self.date_locks.lock(date).await;
        self.clear_locked(date).await
    }

    /// Borra y vuelve a generar dentro de la misma sección crítica
    pub async fn regenerate_routes(&self, date: NaiveDate) -> AppResult<PlanningOutcome> {
        let _guard = self.date_locks.lock(date).await;
        self.clear_locked(date).await?;
        self.generate_locked(date).await
    }

    pub async fn list_routes(&self, filter: &RouteFilter) -> AppResult<Vec<Route>> {
        self.routes.list_routes(filter).await
    }

    pub async fn get_route(&self, id: Uuid) -> AppResult<Route> {
        self.routes.get_route(id).await
    }

    async fn clear_locked(&self, date: NaiveDate) -> AppResult<u64> {
        let in_progress = self
            .routes
            .list_routes(&RouteFilter { date: Some(date), status: Some(RouteStatus::InProgress), ..Default::default() })
            .await?;
        if !in_progress.is_empty() {
            warn!("⚠️ Borrando {} rutas en curso del {}", in_progress.len(), date);
        }

        let deleted = self.routes.delete_routes(date).await?;
        info!("🗑️ {} rutas borradas para {}", deleted, date);
        Ok(deleted)
    }

    async fn generate_locked(&self, date: NaiveDate) -> AppResult<PlanningOutcome> {
        info!("🔄 Generando rutas para {}", date);

        let existing = self.routes.list_routes(&RouteFilter::for_date(date)).await?;
        let services = self
            .services
            .list_services(&ServiceFilter { statuses: Some(PLANNABLE_STATUSES.to_vec()), ..Default::default() })
            .await?;

        let hotels = self.resolve_hotels(services.iter().map(|service| service.hotel_id)).await?;
        let agents = self
            .agents
            .list_active_agents(None)
            .await?
            .into_iter()
            .map(|agent| (agent.id, agent))
            .collect::<HashMap<_, _>>();

        let input = PlanningInput {
            date,
            services: &services,
            hotels: &hotels,
            agents: &agents,
            existing_routes: &existing,
        };

        match self.builder.build(&input, Utc::now())? {
            BuildResult::NoEligibleWork { warnings } => Ok(PlanningOutcome::NoEligibleWork { warnings }),
            BuildResult::Planned(plan) => {
                for route in &plan.routes {
                    self.routes.insert_route(route).await?;
                }
                Ok(PlanningOutcome::Planned {
                    routes: plan.routes,
                    warnings: plan.warnings,
                    covered_agents: plan.covered_agents,
                })
            }
        }
    }

    /// Resuelve los hoteles referenciados; los inexistentes quedan fuera del mapa
    async fn resolve_hotels(&self, ids: impl Iterator<Item = Uuid>) -> AppResult<HashMap<Uuid, Hotel>> {
        let unique: HashSet<Uuid> = ids.collect();
        let lookups = join_all(unique.into_iter().map(|id| self.hotels.get_hotel(id))).await;

        let mut hotels = HashMap::new();
        for lookup in lookups {
            match lookup {
                Ok(hotel) => {
                    hotels.insert(hotel.id, hotel);
                }
                Err(AppError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(hotels)
    }
}
