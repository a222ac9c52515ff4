use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::service_dto::{CreateServiceRequest, DeliveryRequest, TransitionServiceRequest};
use crate::dto::ApiResponse;
use crate::models::Service;
use crate::services::ServiceWorkflowService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct ServiceController {
    workflow: Arc<ServiceWorkflowService>,
}

impl ServiceController {
    pub fn new(state: &AppState) -> Self {
        Self {
            workflow: state.workflow.clone(),
        }
    }

    pub async fn create(&self, request: CreateServiceRequest) -> Result<ApiResponse<Service>, AppError> {
        request.validate()?;
        let service = self.workflow.register_service(request.into()).await?;
        Ok(ApiResponse::success_with_message(service, "Servicio registrado"))
    }

    pub async fn get(&self, id: Uuid) -> Result<ApiResponse<Service>, AppError> {
        let service = self.workflow.get_service(id).await?;
        Ok(ApiResponse::success(service))
    }

    pub async fn claimable(&self, agent_id: Uuid) -> Result<ApiResponse<Vec<Service>>, AppError> {
        let services = self.workflow.claimable_services(agent_id).await?;
        Ok(ApiResponse::success(services))
    }

    pub async fn claim(&self, id: Uuid, agent_id: Uuid) -> Result<ApiResponse<Service>, AppError> {
        let service = self.workflow.claim_service(id, agent_id).await?;
        Ok(ApiResponse::success_with_message(service, "Servicio reclamado"))
    }

    pub async fn transition(
        &self,
        id: Uuid,
        request: TransitionServiceRequest,
    ) -> Result<ApiResponse<Service>, AppError> {
        request.validate()?;
        let service = self.workflow.transition(id, request.into()).await?;
        Ok(ApiResponse::success(service))
    }

    pub async fn deliver(&self, id: Uuid, request: DeliveryRequest) -> Result<ApiResponse<Service>, AppError> {
        request.validate()?;
        let service = self
            .workflow
            .register_delivery(id, request.delivered_bags, request.delivered_at, request.agent_id)
            .await?;

        let message = format!(
            "{} de {} bolsas entregadas",
            service.delivered_bags(),
            service.bag_count
        );
        Ok(ApiResponse::success_with_message(service, message))
    }
}
