//! Servicio de flujo de servicios
//!
//! Registro, reclamación de recogidas por zona y transiciones de estado.
//! Cada escritura es un compare-and-set sobre el estado leído; tras guardar,
//! se avisa a la ejecución de rutas para que reevalúe la parada afectada.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{NewService, Service, ServiceFilter, ServiceStatus};
use crate::repositories::{AgentDirectory, HotelDirectory, ServiceRepository};
use crate::services::priority_classifier::PriorityClassifier;
use crate::services::priority_ranker::ranked;
use crate::services::route_execution_service::RouteExecutionService;
use crate::services::service_lifecycle::{self, TransitionRequest};
use crate::utils::errors::{AppError, AppResult};

pub struct ServiceWorkflowService {
    services: Arc<dyn ServiceRepository>,
    hotels: Arc<dyn HotelDirectory>,
    agents: Arc<dyn AgentDirectory>,
    classifier: Arc<dyn PriorityClassifier>,
    execution: Arc<RouteExecutionService>,
}

impl ServiceWorkflowService {
    pub fn new(
        services: Arc<dyn ServiceRepository>,
        hotels: Arc<dyn HotelDirectory>,
        agents: Arc<dyn AgentDirectory>,
        classifier: Arc<dyn PriorityClassifier>,
        execution: Arc<RouteExecutionService>,
    ) -> Self {
        Self {
            services,
            hotels,
            agents,
            classifier,
            execution,
        }
    }

    pub async fn register_service(&self, new: NewService) -> AppResult<Service> {
        let hotel = self.hotels.get_hotel(new.hotel_id).await?;

        if let Some(agent_id) = new.pickup_agent_id {
            let agent = self.agents.get_agent(agent_id).await?;
            if !agent.active || agent.zone != hotel.zone {
                return Err(AppError::Forbidden(format!(
                    "Agent {} cannot pick up in zone {}",
                    agent.name, hotel.zone
                )));
            }
        }

        let service = service_lifecycle::register(&new, &hotel, self.classifier.as_ref(), Utc::now())?;
        self.services.insert_service(&service).await?;

        info!(
            "🧺 Servicio {} registrado en {} ({} bolsas, prioridad {})",
            service.id, hotel.name, service.bag_count, service.priority
        );
        Ok(service)
    }

    pub async fn get_service(&self, id: Uuid) -> AppResult<Service> {
        self.services.get_service(id).await
    }

    /// Recogidas sin asignar de la zona del repartidor, por urgencia
    pub async fn claimable_services(&self, agent_id: Uuid) -> AppResult<Vec<Service>> {
        let agent = self.agents.get_agent(agent_id).await?;
        if !agent.active {
            return Err(AppError::Forbidden(format!("Agent {} is not active", agent.name)));
        }

        let filter = ServiceFilter {
            zone: Some(agent.zone.clone()),
            statuses: Some(vec![ServiceStatus::PendingPickup]),
            ..Default::default()
        };
        let pool = self
            .services
            .list_services(&filter)
            .await?
            .into_iter()
            .filter(|service| service.is_claimable_by(&agent))
            .collect();

        Ok(ranked(pool))
    }

    /// Asigna la recogida al repartidor. Si dos lo intentan a la vez, solo
    /// uno gana; el otro recibe `Conflict`.
    pub async fn claim_service(&self, service_id: Uuid, agent_id: Uuid) -> AppResult<Service> {
        let agent = self.agents.get_agent(agent_id).await?;
        let service = self.services.get_service(service_id).await?;

        match service.pickup_agent_id {
            Some(owner) if owner == agent_id => return Ok(service),
            Some(_) => {
                return Err(AppError::Conflict(format!("Service {} is already claimed", service_id)));
            }
            None => {}
        }
        if service.status != ServiceStatus::PendingPickup {
            return Err(AppError::Conflict(format!(
                "Service {} is no longer pending pickup ({})",
                service_id, service.status
            )));
        }
        if !service.is_claimable_by(&agent) {
            return Err(AppError::Forbidden(format!(
                "Agent {} cannot claim services in zone {}",
                agent.name, service.zone
            )));
        }

        let mut claimed = service.clone();
        claimed.pickup_agent_id = Some(agent_id);
        let saved = self.services.save_service(&claimed, service.status).await?;

        info!("🙋 Servicio {} reclamado por {}", service_id, agent.name);
        Ok(saved)
    }

    pub async fn transition(&self, service_id: Uuid, request: TransitionRequest) -> AppResult<Service> {
        let service = self.services.get_service(service_id).await?;
        self.apply(service, request).await
    }

    /// Entrega de `bags` bolsas; decide entre entrega parcial y final
    pub async fn register_delivery(
        &self,
        service_id: Uuid,
        bags: i32,
        delivered_at: Option<DateTime<Utc>>,
        agent_id: Option<Uuid>,
    ) -> AppResult<Service> {
        let service = self.services.get_service(service_id).await?;

        let mut request = TransitionRequest::delivery(&service, bags);
        request.delivered_at = delivered_at;
        request.agent_id = agent_id;

        self.apply(service, request).await
    }

    async fn apply(&self, service: Service, request: TransitionRequest) -> AppResult<Service> {
        let hotel = if request.target == ServiceStatus::PickedUp {
            Some(self.hotels.get_hotel(service.hotel_id).await?)
        } else {
            None
        };

        let next = service_lifecycle::apply_transition(&service, &request, hotel.as_ref(), Utc::now())?;
        let saved = self.services.save_service(&next, service.status).await?;

        if saved.status == ServiceStatus::Cancelled {
            warn!("🚫 Servicio {} cancelado", saved.id);
        } else {
            info!("🔁 Servicio {}: {} → {}", saved.id, service.status, saved.status);
        }

        self.execution.on_service_changed(&saved).await;
        Ok(saved)
    }
}
