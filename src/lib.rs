//! Motor de rutas de recogida y entrega para lavandería hotelera
//!
//! Ranking de servicios por urgencia, síntesis de rutas diarias por
//! repartidor, ciclo de vida de rutas y ciclo de vida de servicios, expuestos
//! por una API HTTP sobre axum.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::{response::Json, routing::get, Router};
use serde_json::json;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use middleware::cors::cors_layer;
use state::AppState;

/// Router completo de la API
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/api/routes", routes::route_routes::create_route_router())
        .nest("/api/services", routes::service_routes::create_service_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Endpoint de salud
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "laundry_routing",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
