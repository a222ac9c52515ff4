//! Ciclo de vida del servicio
//!
//! Valida los datos exigidos para entrar en cada estado en el momento de la
//! transición. Trabaja sobre una copia: si la transición falla, el servicio
//! original no se toca.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{Hotel, NewService, Service, ServiceStatus};
use crate::services::priority_classifier::PriorityClassifier;
use crate::utils::errors::{invalid_field, AppError, AppResult};

/// Tope de bolsas por servicio
pub const MAX_BAG_COUNT: i32 = 10_000;

/// Petición de cambio de estado con los datos que exige el estado destino
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionRequest {
    pub target: ServiceStatus,
    pub weight: Option<Decimal>,
    pub picked_up_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub label_photos: Vec<String>,
    /// Bolsas entregadas en esta visita (no el acumulado)
    pub delivered_bags: Option<i32>,
    pub delivery_percentage: Option<i32>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    /// Repartidor que ejecuta la transición
    pub agent_id: Option<Uuid>,
}

impl TransitionRequest {
    pub fn to(target: ServiceStatus) -> Self {
        Self {
            target,
            weight: None,
            picked_up_at: None,
            label_photos: Vec::new(),
            delivered_bags: None,
            delivery_percentage: None,
            delivered_at: None,
            reason: None,
            agent_id: None,
        }
    }

    pub fn pickup(weight: Decimal) -> Self {
        Self { weight: Some(weight), ..Self::to(ServiceStatus::PickedUp) }
    }

    pub fn label(photos: Vec<String>) -> Self {
        Self { label_photos: photos, ..Self::to(ServiceStatus::Labeled) }
    }

    pub fn cancel(reason: impl Into<String>) -> Self {
        Self { reason: Some(reason.into()), ..Self::to(ServiceStatus::Cancelled) }
    }

    /// Entrega de `bags` bolsas: parcial o final según el acumulado
    pub fn delivery(service: &Service, bags: i32) -> Self {
        let total = i64::from(service.delivered_bags()) + i64::from(bags);
        let target = if total >= i64::from(service.bag_count) {
            ServiceStatus::Completed
        } else {
            ServiceStatus::PartialDelivery
        };
        Self { delivered_bags: Some(bags), ..Self::to(target) }
    }

    pub fn by_agent(mut self, agent_id: Uuid) -> Self {
        self.agent_id = Some(agent_id);
        self
    }
}

/// Porcentaje entregado redondeado al entero más cercano
pub fn delivery_percentage(delivered: i32, bag_count: i32) -> i32 {
    if bag_count <= 0 {
        return 0;
    }
    let (delivered, bag_count) = (i64::from(delivered), i64::from(bag_count));
    ((delivered * 100 + bag_count / 2) / bag_count).clamp(0, 100) as i32
}

/// Construye un servicio nuevo en PENDING_PICKUP
pub fn register(
    new: &NewService,
    hotel: &Hotel,
    classifier: &dyn PriorityClassifier,
    now: DateTime<Utc>,
) -> AppResult<Service> {
    let guest_name = new.guest_name.trim();
    if guest_name.is_empty() {
        return Err(AppError::MissingRequiredField { field: "guest_name" });
    }
    let room_number = new.room_number.trim();
    if room_number.is_empty() {
        return Err(AppError::MissingRequiredField { field: "room_number" });
    }
    if !(1..=MAX_BAG_COUNT).contains(&new.bag_count) {
        return Err(invalid_field("bag_count", format!("must be between 1 and {}", MAX_BAG_COUNT)));
    }

    let observations = new
        .observations
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);
    let priority = new
        .priority
        .unwrap_or_else(|| classifier.classify(observations.as_deref()));

    Ok(Service {
        id: Uuid::new_v4(),
        hotel_id: hotel.id,
        zone: hotel.zone.clone(),
        guest_name: guest_name.to_string(),
        room_number: room_number.to_string(),
        bag_count: new.bag_count,
        weight: None,
        priority,
        status: ServiceStatus::PendingPickup,
        pickup_agent_id: new.pickup_agent_id,
        delivery_agent_id: None,
        created_at: now,
        pickup_date: None,
        labeling_date: None,
        delivery_date: None,
        delivered_bag_count: None,
        delivery_percentage: None,
        price: None,
        observations,
        label_photos: Vec::new(),
        cancellation_reason: None,
        version: 0,
    })
}

/// Aplica la transición y devuelve el servicio resultante.
///
/// `hotel` solo se usa al recoger, para calcular el precio.
pub fn apply_transition(
    service: &Service,
    request: &TransitionRequest,
    hotel: Option<&Hotel>,
    now: DateTime<Utc>,
) -> AppResult<Service> {
    let from = service.status;
    let to = request.target;

    if !from.can_transition_to(to) {
        return Err(AppError::InvalidTransition {
            entity: "service",
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    let mut next = service.clone();

    match to {
        ServiceStatus::PendingPickup | ServiceStatus::InProcess | ServiceStatus::ReadyForDelivery => {}
        ServiceStatus::PickedUp => {
            let weight = request.weight.ok_or(AppError::MissingRequiredField { field: "weight" })?;
            if weight < Decimal::ZERO {
                return Err(invalid_field("weight", "must be zero or positive"));
            }

            next.weight = Some(weight);
            next.pickup_date = Some(request.picked_up_at.unwrap_or(now));
            next.price = hotel.map(|hotel| (weight * hotel.price_per_kg).round_dp(2));
            if next.pickup_agent_id.is_none() {
                next.pickup_agent_id = request.agent_id;
            }
        }
        ServiceStatus::Labeled => {
            let photos: Vec<String> = service
                .label_photos
                .iter()
                .chain(request.label_photos.iter())
                .map(|photo| photo.trim())
                .filter(|photo| !photo.is_empty())
                .map(str::to_string)
                .collect();
            if photos.is_empty() {
                return Err(AppError::MissingRequiredField { field: "label_photos" });
            }

            next.label_photos = photos;
            next.labeling_date = Some(now);
        }
        ServiceStatus::PartialDelivery => {
            let bags = request
                .delivered_bags
                .ok_or(AppError::MissingRequiredField { field: "delivered_bag_count" })?;
            let total = service.delivered_bags().checked_add(bags).unwrap_or(i32::MAX);
            if bags < 1 || total >= service.bag_count {
                return Err(invalid_field(
                    "delivered_bag_count",
                    format!(
                        "a partial delivery must leave bags pending ({} of {} already delivered)",
                        service.delivered_bags(),
                        service.bag_count
                    ),
                ));
            }

            let percentage = delivery_percentage(total, service.bag_count);
            if let Some(given) = request.delivery_percentage {
                if (given - percentage).abs() > 1 {
                    return Err(invalid_field(
                        "delivery_percentage",
                        format!("expected {}% for {}/{} bags", percentage, total, service.bag_count),
                    ));
                }
            }

            next.delivered_bag_count = Some(total);
            next.delivery_percentage = Some(percentage);
            assign_delivery_agent(&mut next, request.agent_id);
        }
        ServiceStatus::Completed => {
            let remaining = service.remaining_bags();
            let bags = request.delivered_bags.unwrap_or(remaining);
            if bags != remaining {
                return Err(invalid_field(
                    "delivered_bag_count",
                    format!("completion must deliver the remaining {} bags", remaining),
                ));
            }

            next.delivered_bag_count = Some(service.bag_count);
            next.delivery_percentage = Some(100);
            next.delivery_date = Some(request.delivered_at.unwrap_or(now));
            assign_delivery_agent(&mut next, request.agent_id);
        }
        ServiceStatus::Cancelled => {
            let reason = request
                .reason
                .as_deref()
                .map(str::trim)
                .filter(|reason| !reason.is_empty())
                .ok_or(AppError::MissingRequiredField { field: "reason" })?;
            next.cancellation_reason = Some(reason.to_string());
        }
    }

    next.status = to;
    Ok(next)
}

fn assign_delivery_agent(service: &mut Service, agent_id: Option<Uuid>) {
    if service.delivery_agent_id.is_none() {
        service.delivery_agent_id = agent_id;
    }
}
