//! Repartidores y hoteles
//!
//! Entidades de solo lectura para el motor: las gestionan colaboradores externos
//! (gestión de usuarios y catálogo de hoteles).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Repartidor asignado a una zona
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Agent {
    pub id: Uuid,
    pub name: String,
    pub zone: String,
    pub active: bool,
}

/// Hotel cliente
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Hotel {
    pub id: Uuid,
    pub name: String,
    pub zone: String,
    pub address: Option<String>,
    pub price_per_kg: Decimal,
}
