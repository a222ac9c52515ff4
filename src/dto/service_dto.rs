use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::{NewService, ServicePriority, ServiceStatus};
use crate::services::service_lifecycle::TransitionRequest;
use crate::utils::validation::{validate_not_blank, validate_photo_references};

// Request para registrar un servicio
#[derive(Debug, Deserialize, Validate)]
pub struct CreateServiceRequest {
    pub hotel_id: Uuid,
    #[validate(length(min = 1, max = 120), custom = "validate_not_blank")]
    pub guest_name: String,
    #[validate(length(min = 1, max = 20), custom = "validate_not_blank")]
    pub room_number: String,
    #[validate(range(min = 1, max = 10000))]
    pub bag_count: i32,
    pub priority: Option<ServicePriority>,
    #[validate(length(max = 1000))]
    pub observations: Option<String>,
    pub pickup_agent_id: Option<Uuid>,
}

impl From<CreateServiceRequest> for NewService {
    fn from(request: CreateServiceRequest) -> Self {
        NewService {
            hotel_id: request.hotel_id,
            guest_name: request.guest_name,
            room_number: request.room_number,
            bag_count: request.bag_count,
            priority: request.priority,
            observations: request.observations,
            pickup_agent_id: request.pickup_agent_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ClaimServiceRequest {
    pub agent_id: Uuid,
}

// Request de cambio de estado
#[derive(Debug, Deserialize, Validate)]
pub struct TransitionServiceRequest {
    pub target: ServiceStatus,
    pub weight: Option<Decimal>,
    pub picked_up_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[validate(custom = "validate_photo_references")]
    pub label_photos: Vec<String>,
    #[validate(range(min = 1, max = 10000))]
    pub delivered_bags: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub delivery_percentage: Option<i32>,
    pub delivered_at: Option<DateTime<Utc>>,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
    pub agent_id: Option<Uuid>,
}

impl From<TransitionServiceRequest> for TransitionRequest {
    fn from(request: TransitionServiceRequest) -> Self {
        TransitionRequest {
            target: request.target,
            weight: request.weight,
            picked_up_at: request.picked_up_at,
            label_photos: request.label_photos,
            delivered_bags: request.delivered_bags,
            delivery_percentage: request.delivery_percentage,
            delivered_at: request.delivered_at,
            reason: request.reason,
            agent_id: request.agent_id,
        }
    }
}

// Request de entrega (parcial o final según el acumulado)
#[derive(Debug, Deserialize, Validate)]
pub struct DeliveryRequest {
    #[validate(range(min = 1, max = 10000))]
    pub delivered_bags: i32,
    pub delivered_at: Option<DateTime<Utc>>,
    pub agent_id: Option<Uuid>,
}
