//! Routers HTTP
//!
//! Cada router se monta bajo `/api` desde `create_app`.

pub mod route_routes;
pub mod service_routes;
