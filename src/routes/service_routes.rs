use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::service_controller::ServiceController;
use crate::dto::service_dto::{ClaimServiceRequest, CreateServiceRequest, DeliveryRequest, TransitionServiceRequest};
use crate::dto::ApiResponse;
use crate::models::Service;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_service_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_service))
        .route("/:id", get(get_service))
        .route("/claimable/:agent_id", get(claimable_services))
        .route("/:id/claim", post(claim_service))
        .route("/:id/transition", post(transition_service))
        .route("/:id/deliver", post(deliver_service))
}

async fn create_service(
    State(state): State<AppState>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<Json<ApiResponse<Service>>, AppError> {
    let controller = ServiceController::new(&state);
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Service>>, AppError> {
    let controller = ServiceController::new(&state);
    let response = controller.get(id).await?;
    Ok(Json(response))
}

async fn claimable_services(
    State(state): State<AppState>,
    Path(agent_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Service>>>, AppError> {
    let controller = ServiceController::new(&state);
    let response = controller.claimable(agent_id).await?;
    Ok(Json(response))
}

async fn claim_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ClaimServiceRequest>,
) -> Result<Json<ApiResponse<Service>>, AppError> {
    let controller = ServiceController::new(&state);
    let response = controller.claim(id, request.agent_id).await?;
    Ok(Json(response))
}

async fn transition_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionServiceRequest>,
) -> Result<Json<ApiResponse<Service>>, AppError> {
    let controller = ServiceController::new(&state);
    let response = controller.transition(id, request).await?;
    Ok(Json(response))
}

async fn deliver_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DeliveryRequest>,
) -> Result<Json<ApiResponse<Service>>, AppError> {
    let controller = ServiceController::new(&state);
    let response = controller.deliver(id, request).await?;
    Ok(Json(response))
}
