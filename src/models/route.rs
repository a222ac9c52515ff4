//! Modelo de Route
//!
//! Este módulo contiene la ruta diaria de un repartidor, sus paradas (una por
//! hotel) y la traza de auditoría de sus cambios de estado.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

use super::service::ServicePriority;

/// Estado de la ruta - mapea al ENUM route_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "route_status", rename_all = "snake_case")]
pub enum RouteStatus {
    Pending,
    InProgress,
    Completed,
}

impl RouteStatus {
    /// Una ruta pendiente o en curso bloquea al repartidor para esa fecha
    pub fn is_active(self) -> bool {
        matches!(self, RouteStatus::Pending | RouteStatus::InProgress)
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RouteStatus::Pending => "PENDING",
            RouteStatus::InProgress => "IN_PROGRESS",
            RouteStatus::Completed => "COMPLETED",
        };
        f.write_str(label)
    }
}

/// Cómo se cerró la ruta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompletionKind {
    Organic,
    AdminOverride { admin_id: Uuid, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RouteEventKind {
    Created,
    Started { agent_id: Uuid },
    StopCompleted { stop_id: Uuid, automatic: bool },
    Completed,
    ForceCompleted { admin_id: Uuid, reason: String, pending_stops: Vec<Uuid> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEvent {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: RouteEventKind,
}

/// Parada: una visita a un hotel dentro de la ruta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: Uuid,
    pub sequence: i32,
    pub hotel_id: Uuid,
    pub hotel_name: String,
    /// Recogidas ordenadas por prioridad
    pub pickups: Vec<Uuid>,
    /// Entregas ordenadas por prioridad
    pub deliveries: Vec<Uuid>,
    pub priority: ServicePriority,
    pub eta: NaiveTime,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Stop {
    pub fn contains_service(&self, service_id: Uuid) -> bool {
        self.pickups.contains(&service_id) || self.deliveries.contains(&service_id)
    }
}

/// Route principal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub route_number: i32,
    pub agent_id: Uuid,
    pub agent_name: String,
    pub route_date: NaiveDate,
    pub status: RouteStatus,
    pub estimated_duration_minutes: i32,
    pub stops: Vec<Stop>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub total_pickups: i32,
    pub total_deliveries: i32,
    pub completion_kind: Option<CompletionKind>,
    pub audit_trail: Vec<RouteEvent>,
}

impl Route {
    pub fn stop(&self, stop_id: Uuid) -> Option<&Stop> {
        self.stops.iter().find(|stop| stop.id == stop_id)
    }

    pub fn stop_for_service(&self, service_id: Uuid) -> Option<&Stop> {
        self.stops.iter().find(|stop| stop.contains_service(service_id))
    }

    pub fn pending_stops(&self) -> Vec<Uuid> {
        self.stops
            .iter()
            .filter(|stop| !stop.completed)
            .map(|stop| stop.id)
            .collect()
    }

    pub fn record(&mut self, at: DateTime<Utc>, kind: RouteEventKind) {
        self.audit_trail.push(RouteEvent { at, kind });
    }
}

/// Filtros para búsqueda de rutas
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteFilter {
    pub date: Option<NaiveDate>,
    pub agent_id: Option<Uuid>,
    pub status: Option<RouteStatus>,
}

impl RouteFilter {
    pub fn for_date(date: NaiveDate) -> Self {
        Self { date: Some(date), ..Default::default() }
    }

    pub fn matches(&self, route: &Route) -> bool {
        self.date.map_or(true, |date| route.route_date == date)
            && self.agent_id.map_or(true, |agent_id| route.agent_id == agent_id)
            && self.status.map_or(true, |status| route.status == status)
    }
}
