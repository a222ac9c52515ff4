//! Controladores
//!
//! Traducen las peticiones validadas a llamadas de servicio y envuelven el
//! resultado en `ApiResponse`.

pub mod route_controller;
pub mod service_controller;
