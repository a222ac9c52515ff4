//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del motor de rutas y su
//! conversión a respuestas HTTP apropiadas. Todos son recuperables por el
//! llamador; cada uno lleva un código distinto para que la interfaz pueda
//! mostrarlos por separado.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid {entity} transition from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Missing required field: {field}")]
    MissingRequiredField { field: &'static str },

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Routes already exist for {date} (agents: {agents:?})")]
    RoutesAlreadyExist { date: NaiveDate, agents: Vec<Uuid> },

    #[error("{resource} with id '{id}' not found")]
    NotFound { resource: &'static str, id: String },

    #[error("Route {route_id} is not pending")]
    RouteNotPending { route_id: Uuid },

    #[error("Route {route_id} is not in progress")]
    RouteNotInProgress { route_id: Uuid },

    #[error("Route {route_id} has {} incomplete stops", .pending_stops.len())]
    RouteIncomplete { route_id: Uuid, pending_stops: Vec<Uuid> },

    #[error("Agent {agent_id} does not own route {route_id}")]
    NotRouteOwner { route_id: Uuid, agent_id: Uuid },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// Código estable que la interfaz usa para distinguir errores
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::MissingRequiredField { .. } => "MISSING_REQUIRED_FIELD",
            AppError::InvalidField { .. } => "INVALID_FIELD",
            AppError::Conflict(_) => "CONFLICT",
            AppError::RoutesAlreadyExist { .. } => "ROUTES_ALREADY_EXIST",
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::RouteNotPending { .. } => "ROUTE_NOT_PENDING",
            AppError::RouteNotInProgress { .. } => "ROUTE_NOT_IN_PROGRESS",
            AppError::RouteIncomplete { .. } => "ROUTE_INCOMPLETE",
            AppError::NotRouteOwner { .. } => "NOT_ROUTE_OWNER",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Database(_) => "DB_ERROR",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidTransition { .. }
            | AppError::RouteNotPending { .. }
            | AppError::RouteNotInProgress { .. }
            | AppError::RouteIncomplete { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MissingRequiredField { .. }
            | AppError::InvalidField { .. }
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) | AppError::RoutesAlreadyExist { .. } => StatusCode::CONFLICT,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::NotRouteOwner { .. } | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Detalles estructurados: campo o entidad implicada
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::InvalidTransition { entity, from, to } => {
                Some(json!({ "entity": entity, "from": from, "to": to }))
            }
            AppError::MissingRequiredField { field } => Some(json!({ "field": field })),
            AppError::InvalidField { field, reason } => Some(json!({ "field": field, "reason": reason })),
            AppError::RoutesAlreadyExist { date, agents } => Some(json!({ "date": date, "agents": agents })),
            AppError::NotFound { resource, id } => Some(json!({ "resource": resource, "id": id })),
            AppError::RouteIncomplete { route_id, pending_stops } => {
                Some(json!({ "route_id": route_id, "pending_stops": pending_stops }))
            }
            AppError::Validation(e) => Some(json!(e)),
            _ => None,
        }
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("❌ Database error: {}", e);
                "An error occurred while accessing the database".to_string()
            }
            other => {
                tracing::warn!("⚠️ {}", other);
                other.to_string()
            }
        };

        let error_response = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message,
            details: self.details(),
            code: self.code().to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &'static str, id: impl ToString) -> AppError {
    AppError::NotFound { resource, id: id.to_string() }
}

/// Función helper para crear errores de conflicto de concurrencia
pub fn conflict_error(resource: &str, id: impl ToString) -> AppError {
    AppError::Conflict(format!("{} '{}' was modified concurrently", resource, id.to_string()))
}

pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> AppError {
    AppError::InvalidField { field, reason: reason.into() }
}
