//! Modelo de Service
//!
//! Un servicio es la recogida/entrega de las bolsas de un huésped (habitación)
//! en un hotel. Contiene la tabla de estados y las transiciones permitidas.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use super::agent::Agent;

/// Prioridad del servicio - mapea al ENUM service_priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "service_priority", rename_all = "snake_case")]
pub enum ServicePriority {
    High,
    Medium,
    Normal,
}

impl ServicePriority {
    /// Urgencia numérica: cuanto mayor, antes se atiende
    pub fn urgency(self) -> u8 {
        match self {
            ServicePriority::High => 3,
            ServicePriority::Medium => 2,
            ServicePriority::Normal => 1,
        }
    }
}

impl fmt::Display for ServicePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServicePriority::High => "HIGH",
            ServicePriority::Medium => "MEDIUM",
            ServicePriority::Normal => "NORMAL",
        };
        f.write_str(label)
    }
}

/// Estado del servicio - mapea al ENUM service_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "service_status", rename_all = "snake_case")]
pub enum ServiceStatus {
    PendingPickup,
    PickedUp,
    Labeled,
    InProcess,
    ReadyForDelivery,
    PartialDelivery,
    Completed,
    Cancelled,
}

impl ServiceStatus {
    /// Estados alcanzables desde el estado actual
    pub fn allowed_transitions(self) -> &'static [ServiceStatus] {
        use ServiceStatus::*;
        match self {
            PendingPickup => &[PickedUp, Cancelled],
            PickedUp => &[Labeled, Cancelled],
            Labeled => &[InProcess, Cancelled],
            InProcess => &[ReadyForDelivery, PartialDelivery, Completed, Cancelled],
            ReadyForDelivery => &[PartialDelivery, Completed, Cancelled],
            PartialDelivery => &[Completed, Cancelled],
            Completed | Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, target: ServiceStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }
}

impl sqlx::postgres::PgHasArrayType for ServiceStatus {
    fn array_type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("_service_status")
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServiceStatus::PendingPickup => "PENDING_PICKUP",
            ServiceStatus::PickedUp => "PICKED_UP",
            ServiceStatus::Labeled => "LABELED",
            ServiceStatus::InProcess => "IN_PROCESS",
            ServiceStatus::ReadyForDelivery => "READY_FOR_DELIVERY",
            ServiceStatus::PartialDelivery => "PARTIAL_DELIVERY",
            ServiceStatus::Completed => "COMPLETED",
            ServiceStatus::Cancelled => "CANCELLED",
        };
        f.write_str(label)
    }
}

/// Asignación de recogida de un servicio.
///
/// Un servicio sin repartidor no queda huérfano: pertenece a la bolsa de
/// trabajo reclamable de la zona de su hotel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    Agent(Uuid),
    ClaimableBy(String),
}

/// Service principal - mapea a la tabla services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Service {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub zone: String,
    pub guest_name: String,
    pub room_number: String,
    pub bag_count: i32,
    pub weight: Option<Decimal>,
    pub priority: ServicePriority,
    pub status: ServiceStatus,
    pub pickup_agent_id: Option<Uuid>,
    pub delivery_agent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub pickup_date: Option<DateTime<Utc>>,
    pub labeling_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub delivered_bag_count: Option<i32>,
    pub delivery_percentage: Option<i32>,
    pub price: Option<Decimal>,
    pub observations: Option<String>,
    pub label_photos: Vec<String>,
    pub cancellation_reason: Option<String>,
    /// Contador de versión para el compare-and-set del repositorio
    pub version: i64,
}

impl Service {
    pub fn pickup_assignment(&self) -> Assignment {
        match self.pickup_agent_id {
            Some(agent_id) => Assignment::Agent(agent_id),
            None => Assignment::ClaimableBy(self.zone.clone()),
        }
    }

    /// Un repartidor activo de la zona puede reclamar una recogida sin asignar
    pub fn is_claimable_by(&self, agent: &Agent) -> bool {
        self.status == ServiceStatus::PendingPickup
            && agent.active
            && matches!(self.pickup_assignment(), Assignment::ClaimableBy(ref zone) if *zone == agent.zone)
    }

    pub fn is_pickup_candidate(&self) -> bool {
        self.status == ServiceStatus::PendingPickup
    }

    /// Servicios con bolsas todavía por devolver al huésped
    pub fn is_delivery_candidate(&self) -> bool {
        match self.status {
            ServiceStatus::ReadyForDelivery | ServiceStatus::PartialDelivery => true,
            ServiceStatus::Completed => self.delivery_date.is_none(),
            _ => false,
        }
    }

    /// Repartidor que entrega; si no hay uno específico, quien recogió
    pub fn resolved_delivery_agent(&self) -> Option<Uuid> {
        self.delivery_agent_id.or(self.pickup_agent_id)
    }

    pub fn delivered_bags(&self) -> i32 {
        self.delivered_bag_count.unwrap_or(0)
    }

    pub fn remaining_bags(&self) -> i32 {
        self.bag_count - self.delivered_bags()
    }

    pub fn registered_on(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// Datos para registrar un servicio nuevo
#[derive(Debug, Clone, Default)]
pub struct NewService {
    pub hotel_id: Uuid,
    pub guest_name: String,
    pub room_number: String,
    pub bag_count: i32,
    pub priority: Option<ServicePriority>,
    pub observations: Option<String>,
    pub pickup_agent_id: Option<Uuid>,
}

/// Filtros para búsqueda de servicios
#[derive(Debug, Clone, Default)]
pub struct ServiceFilter {
    /// Fecha de registro exacta
    pub date: Option<NaiveDate>,
    pub zone: Option<String>,
    /// Coincide con el repartidor de recogida o de entrega
    pub agent_id: Option<Uuid>,
    pub statuses: Option<Vec<ServiceStatus>>,
}

impl ServiceFilter {
    pub fn matches(&self, service: &Service) -> bool {
        if let Some(date) = self.date {
            if service.registered_on() != date {
                return false;
            }
        }
        if let Some(zone) = &self.zone {
            if &service.zone != zone {
                return false;
            }
        }
        if let Some(agent_id) = self.agent_id {
            if service.pickup_agent_id != Some(agent_id) && service.delivery_agent_id != Some(agent_id) {
                return false;
            }
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&service.status) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_service(zone: &str) -> Service {
        Service {
            id: Uuid::new_v4(),
            hotel_id: Uuid::new_v4(),
            zone: zone.to_string(),
            guest_name: "Ana".to_string(),
            room_number: "101".to_string(),
            bag_count: 3,
            weight: None,
            priority: ServicePriority::Normal,
            status: ServiceStatus::PendingPickup,
            pickup_agent_id: None,
            delivery_agent_id: None,
            created_at: Utc::now(),
            pickup_date: None,
            labeling_date: None,
            delivery_date: None,
            delivered_bag_count: None,
            delivery_percentage: None,
            price: None,
            observations: None,
            label_photos: Vec::new(),
            cancellation_reason: None,
            version: 0,
        }
    }

    #[test]
    fn test_terminal_states_have_no_transitions() {
        assert!(ServiceStatus::Completed.allowed_transitions().is_empty());
        assert!(ServiceStatus::Cancelled.allowed_transitions().is_empty());
        assert!(!ServiceStatus::PartialDelivery.can_transition_to(ServiceStatus::PartialDelivery));
        assert!(ServiceStatus::InProcess.can_transition_to(ServiceStatus::Completed));
        assert!(!ServiceStatus::PickedUp.can_transition_to(ServiceStatus::InProcess));
    }

    #[test]
    fn test_unassigned_service_is_claimable_by_zone() {
        let service = pending_service("Sur");
        assert_eq!(service.pickup_assignment(), Assignment::ClaimableBy("Sur".to_string()));

        let mut agent = Agent { id: Uuid::new_v4(), name: "Luis".to_string(), zone: "Sur".to_string(), active: true };
        assert!(service.is_claimable_by(&agent));

        agent.zone = "Norte".to_string();
        assert!(!service.is_claimable_by(&agent));
    }

    #[test]
    fn test_completed_without_delivery_date_is_delivery_candidate() {
        let mut service = pending_service("Centro");
        service.status = ServiceStatus::Completed;
        assert!(service.is_delivery_candidate());
        service.delivery_date = Some(Utc::now());
        assert!(!service.is_delivery_candidate());
    }
}
