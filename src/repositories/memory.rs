//! Almacén en memoria
//!
//! Implementa los cuatro repositorios sobre mapas indexados por id, con
//! escrituras puntuales por entidad. Es el backend por defecto y el de los tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AgentDirectory, HotelDirectory, RouteRepository, ServiceRepository};
use crate::models::{Agent, Hotel, Route, RouteFilter, Service, ServiceFilter, ServiceStatus};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

#[derive(Default)]
pub struct InMemoryStore {
    services: RwLock<HashMap<Uuid, Service>>,
    routes: RwLock<HashMap<Uuid, Route>>,
    hotels: RwLock<HashMap<Uuid, Hotel>>,
    agents: RwLock<HashMap<Uuid, Agent>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert_hotel(&self, hotel: Hotel) {
        self.hotels.write().await.insert(hotel.id, hotel);
    }

    pub async fn upsert_agent(&self, agent: Agent) {
        self.agents.write().await.insert(agent.id, agent);
    }

    pub async fn remove_hotel(&self, id: Uuid) {
        self.hotels.write().await.remove(&id);
    }
}

#[async_trait]
impl ServiceRepository for InMemoryStore {
    async fn list_services(&self, filter: &ServiceFilter) -> AppResult<Vec<Service>> {
        let services = self.services.read().await;
        let mut result: Vec<Service> = services
            .values()
            .filter(|service| filter.matches(service))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(result)
    }

    async fn get_service(&self, id: Uuid) -> AppResult<Service> {
        self.services
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found_error("Service", id))
    }

    async fn insert_service(&self, service: &Service) -> AppResult<()> {
        let mut services = self.services.write().await;
        if services.contains_key(&service.id) {
            return Err(AppError::Conflict(format!("Service '{}' already exists", service.id)));
        }
        services.insert(service.id, service.clone());
        Ok(())
    }

    async fn save_service(&self, service: &Service, expected_status: ServiceStatus) -> AppResult<Service> {
        let mut services = self.services.write().await;
        let stored = services
            .get_mut(&service.id)
            .ok_or_else(|| not_found_error("Service", service.id))?;

        if stored.status != expected_status || stored.version != service.version {
            return Err(conflict_error("Service", service.id));
        }

        let mut saved = service.clone();
        saved.version += 1;
        *stored = saved.clone();
        Ok(saved)
    }
}

#[async_trait]
impl HotelDirectory for InMemoryStore {
    async fn get_hotel(&self, id: Uuid) -> AppResult<Hotel> {
        self.hotels
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found_error("Hotel", id))
    }
}

#[async_trait]
impl AgentDirectory for InMemoryStore {
    async fn list_active_agents(&self, zone: Option<&str>) -> AppResult<Vec<Agent>> {
        let agents = self.agents.read().await;
        let mut result: Vec<Agent> = agents
            .values()
            .filter(|agent| agent.active && zone.map_or(true, |zone| agent.zone == zone))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(result)
    }

    async fn get_agent(&self, id: Uuid) -> AppResult<Agent> {
        self.agents
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found_error("Agent", id))
    }
}

#[async_trait]
impl RouteRepository for InMemoryStore {
    async fn list_routes(&self, filter: &RouteFilter) -> AppResult<Vec<Route>> {
        let routes = self.routes.read().await;
        let mut result: Vec<Route> = routes.values().filter(|route| filter.matches(route)).cloned().collect();
        result.sort_by(|a, b| {
            a.route_date
                .cmp(&b.route_date)
                .then_with(|| a.route_number.cmp(&b.route_number))
        });
        Ok(result)
    }

    async fn get_route(&self, id: Uuid) -> AppResult<Route> {
        self.routes
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found_error("Route", id))
    }

    async fn insert_route(&self, route: &Route) -> AppResult<()> {
        let mut routes = self.routes.write().await;
        if routes.contains_key(&route.id) {
            return Err(AppError::Conflict(format!("Route '{}' already exists", route.id)));
        }
        check_route_constraints(&routes, route)?;

        routes.insert(route.id, route.clone());
        Ok(())
    }

    async fn update_route(&self, route: &Route) -> AppResult<()> {
        let mut routes = self.routes.write().await;
        if !routes.contains_key(&route.id) {
            return Err(not_found_error("Route", route.id));
        }
        check_route_constraints(&routes, route)?;

        routes.insert(route.id, route.clone());
        Ok(())
    }

    async fn delete_routes(&self, date: NaiveDate) -> AppResult<u64> {
        let mut routes = self.routes.write().await;
        let before = routes.len();
        routes.retain(|_, route| route.route_date != date);
        Ok((before - routes.len()) as u64)
    }
}

// Mismas restricciones que los índices únicos de PostgreSQL
fn check_route_constraints(routes: &HashMap<Uuid, Route>, route: &Route) -> AppResult<()> {
    let duplicate = routes.values().any(|other| {
        other.id != route.id
            && other.route_date == route.route_date
            && (other.route_number == route.route_number
                || (other.agent_id == route.agent_id && other.status.is_active() && route.status.is_active()))
    });
    if duplicate {
        return Err(AppError::Conflict(format!(
            "Route {} for agent {} on {} collides with an existing route",
            route.route_number, route.agent_id, route.route_date
        )));
    }
    Ok(())
}
