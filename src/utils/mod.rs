//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación y
//! exclusión mutua por clave.

pub mod errors;
pub mod locks;
pub mod validation;
