//! Configuración del proyecto
//!
//! Este módulo contiene la configuración de base de datos, variables de entorno
//! y los parámetros de planificación de rutas.

pub mod database;
pub mod environment;
pub mod planning;

pub use environment::*;
pub use planning::PlanningConfig;
