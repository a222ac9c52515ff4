//! Modelos del sistema
//!
//! Este módulo contiene los modelos de dominio: servicios de lavandería,
//! rutas con sus paradas, repartidores y hoteles.

pub mod agent;
pub mod route;
pub mod service;

pub use agent::{Agent, Hotel};
pub use route::{CompletionKind, Route, RouteEvent, RouteEventKind, RouteFilter, RouteStatus, Stop};
pub use service::{Assignment, NewService, Service, ServiceFilter, ServicePriority, ServiceStatus};
