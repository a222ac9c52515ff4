//! Repositorios
//!
//! Interfaces de los colaboradores externos que consume el motor de rutas:
//! servicios, rutas, directorio de hoteles y directorio de repartidores.
//! El núcleo no guarda estado global; todo pasa por estas interfaces.

pub mod directory_repository;
pub mod memory;
pub mod route_repository;
pub mod service_repository;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{Agent, Hotel, Route, RouteFilter, Service, ServiceFilter, ServiceStatus};
use crate::utils::errors::AppResult;

pub use directory_repository::PgDirectory;
pub use memory::InMemoryStore;
pub use route_repository::PgRouteRepository;
pub use service_repository::PgServiceRepository;

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    /// Servicios ordenados por fecha de registro
    async fn list_services(&self, filter: &ServiceFilter) -> AppResult<Vec<Service>>;

    async fn get_service(&self, id: Uuid) -> AppResult<Service>;

    async fn insert_service(&self, service: &Service) -> AppResult<()>;

    /// Compare-and-set: solo escribe si el registro guardado sigue en
    /// `expected_status` y con la misma `version` que trae `service`.
    /// Devuelve el servicio guardado con la versión incrementada.
    async fn save_service(&self, service: &Service, expected_status: ServiceStatus) -> AppResult<Service>;
}

#[async_trait]
pub trait HotelDirectory: Send + Sync {
    async fn get_hotel(&self, id: Uuid) -> AppResult<Hotel>;
}

#[async_trait]
pub trait AgentDirectory: Send + Sync {
    async fn list_active_agents(&self, zone: Option<&str>) -> AppResult<Vec<Agent>>;

    async fn get_agent(&self, id: Uuid) -> AppResult<Agent>;
}

#[async_trait]
pub trait RouteRepository: Send + Sync {
    /// Rutas ordenadas por número de ruta
    async fn list_routes(&self, filter: &RouteFilter) -> AppResult<Vec<Route>>;

    async fn get_route(&self, id: Uuid) -> AppResult<Route>;

    /// Alta de una ruta nueva; un id repetido es un conflicto
    async fn insert_route(&self, route: &Route) -> AppResult<()>;

    /// Reescribe una ruta existente. Si la ruta ya no existe (borrada al
    /// regenerar) devuelve `NotFound` y no la vuelve a crear.
    async fn update_route(&self, route: &Route) -> AppResult<()>;

    async fn delete_routes(&self, date: NaiveDate) -> AppResult<u64>;
}
