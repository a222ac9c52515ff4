//! Servicio de ejecución de rutas
//!
//! Inicio, cierre de paradas y cierre de ruta, más la reevaluación automática
//! de paradas cuando cambia el estado de un servicio. Toda escritura sobre una
//! ruta pasa por el candado de esa ruta.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{Route, RouteFilter, RouteStatus, Service, ServiceStatus};
use crate::repositories::{RouteRepository, ServiceRepository};
use crate::services::route_lifecycle::{self, AdminOverride, StopCompletion};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::locks::KeyedLocks;

pub struct RouteExecutionService {
    services: Arc<dyn ServiceRepository>,
    routes: Arc<dyn RouteRepository>,
    route_locks: KeyedLocks<Uuid>,
}

impl RouteExecutionService {
    pub fn new(services: Arc<dyn ServiceRepository>, routes: Arc<dyn RouteRepository>) -> Self {
        Self {
            services,
            routes,
            route_locks: KeyedLocks::new(),
        }
    }

    /// Inicia la ruta. Un repartidor no puede tener dos rutas en curso el mismo día.
    pub async fn start_route(&self, route_id: Uuid, agent_id: Uuid) -> AppResult<Route> {
        let _guard = self.route_locks.lock(route_id).await;
        let mut route = self.routes.get_route(route_id).await?;

        let running = self
            .routes
            .list_routes(&RouteFilter {
                date: Some(route.route_date),
                agent_id: Some(agent_id),
                status: Some(RouteStatus::InProgress),
            })
            .await?;
        if let Some(other) = running.iter().find(|other| other.id != route_id) {
            return Err(AppError::Conflict(format!(
                "Agent {} already has route {} in progress",
                agent_id, other.route_number
            )));
        }

        route_lifecycle::start(&mut route, agent_id, Utc::now())?;
        self.routes.update_route(&route).await?;
        Ok(route)
    }

    pub async fn complete_stop(
        &self,
        route_id: Uuid,
        stop_id: Uuid,
        completion: StopCompletion,
    ) -> AppResult<Route> {
        let _guard = self.route_locks.lock(route_id).await;
        let mut route = self.routes.get_route(route_id).await?;

        if route_lifecycle::mark_stop_complete(&mut route, stop_id, completion, Utc::now())? {
            self.routes.update_route(&route).await?;
        }
        Ok(route)
    }

    /// Cierre orgánico, o forzado si llega un `AdminOverride`
    pub async fn complete_route(&self, route_id: Uuid, admin: Option<AdminOverride>) -> AppResult<Route> {
        let _guard = self.route_locks.lock(route_id).await;
        let mut route = self.routes.get_route(route_id).await?;

        match admin {
            Some(admin) => route_lifecycle::force_complete(&mut route, admin, Utc::now())?,
            None => route_lifecycle::complete(&mut route, Utc::now())?,
        }
        self.routes.update_route(&route).await?;
        Ok(route)
    }

    /// Reevalúa la parada en curso que contiene al servicio tras un cambio de estado.
    ///
    /// El cambio del servicio ya está guardado: los fallos aquí se registran y
    /// no se propagan. Devuelve la ruta si alguna parada pasó a completada.
    pub async fn on_service_changed(&self, service: &Service) -> Option<Route> {
        match self.reevaluate_for(service).await {
            Ok(updated) => updated,
            Err(e) => {
                error!("❌ Error reevaluando la parada del servicio {}: {}", service.id, e);
                None
            }
        }
    }

    async fn reevaluate_for(&self, service: &Service) -> AppResult<Option<Route>> {
        let Some(route_id) = self.find_active_route(service).await? else {
            return Ok(None);
        };

        let _guard = self.route_locks.lock(route_id).await;
        let mut route = self.routes.get_route(route_id).await?;
        let Some(stop) = route.stop_for_service(service.id) else {
            return Ok(None);
        };
        let stop_id = stop.id;

        let statuses = self.stop_statuses(&route, stop_id, service).await?;
        if !route_lifecycle::reevaluate_stop(&mut route, stop_id, &statuses, Utc::now())? {
            return Ok(None);
        }

        self.routes.update_route(&route).await?;
        info!("📍 Parada {} completada automáticamente en la ruta {}", stop_id, route.route_number);
        Ok(Some(route))
    }

    /// Ruta en curso con una parada que contiene al servicio; primero se buscan
    /// las rutas de sus repartidores y después todas las que están en curso
    async fn find_active_route(&self, service: &Service) -> AppResult<Option<Uuid>> {
        let mut candidates: Vec<Option<Uuid>> = Vec::new();
        for agent_id in [service.pickup_agent_id, service.resolved_delivery_agent()].into_iter().flatten() {
            if !candidates.contains(&Some(agent_id)) {
                candidates.push(Some(agent_id));
            }
        }
        candidates.push(None);

        for agent_id in candidates {
            let filter = RouteFilter {
                agent_id,
                status: Some(RouteStatus::InProgress),
                ..Default::default()
            };
            let routes = self.routes.list_routes(&filter).await?;
            if let Some(route) = routes.iter().find(|route| route.stop_for_service(service.id).is_some()) {
                return Ok(Some(route.id));
            }
        }
        Ok(None)
    }

    async fn stop_statuses(
        &self,
        route: &Route,
        stop_id: Uuid,
        changed: &Service,
    ) -> AppResult<HashMap<Uuid, ServiceStatus>> {
        let Some(stop) = route.stop(stop_id) else {
            return Ok(HashMap::new());
        };

        let others: Vec<Uuid> = stop
            .pickups
            .iter()
            .chain(stop.deliveries.iter())
            .copied()
            .filter(|id| *id != changed.id)
            .collect();

        let mut statuses = HashMap::from([(changed.id, changed.status)]);
        for lookup in join_all(others.into_iter().map(|id| self.services.get_service(id))).await {
            match lookup {
                Ok(service) => {
                    statuses.insert(service.id, service.status);
                }
                // un servicio borrado deja la parada sin cumplir
                Err(AppError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(statuses)
    }
}
