use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::services::route_lifecycle::{AdminOverride, StopCompletion};

// Request para generar (o regenerar) las rutas de un día
#[derive(Debug, Deserialize)]
pub struct GenerateRoutesRequest {
    pub date: NaiveDate,
}

// Query ?date= para borrar rutas
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct ClearRoutesResponse {
    pub date: NaiveDate,
    pub deleted: u64,
}

#[derive(Debug, Deserialize)]
pub struct StartRouteRequest {
    pub agent_id: Uuid,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CompleteStopRequest {
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<CompleteStopRequest> for StopCompletion {
    fn from(request: CompleteStopRequest) -> Self {
        StopCompletion {
            notes: request.notes,
            completed_at: request.completed_at,
        }
    }
}

/// Sin `admin_id` el cierre es orgánico; con él, es un cierre forzado
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CompleteRouteRequest {
    pub admin_id: Option<Uuid>,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

impl CompleteRouteRequest {
    pub fn admin_override(self) -> Option<AdminOverride> {
        self.admin_id.map(|admin_id| AdminOverride {
            admin_id,
            reason: self.reason.unwrap_or_default(),
        })
    }
}
