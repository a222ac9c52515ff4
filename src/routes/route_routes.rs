use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::route_controller::RouteController;
use crate::dto::route_dto::{
    ClearRoutesResponse, CompleteRouteRequest, CompleteStopRequest, DateQuery, GenerateRoutesRequest,
    StartRouteRequest,
};
use crate::dto::ApiResponse;
use crate::models::{Route, RouteFilter};
use crate::services::PlanningOutcome;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_route_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_routes).delete(clear_routes))
        .route("/generate", post(generate_routes))
        .route("/regenerate", post(regenerate_routes))
        .route("/:id", get(get_route))
        .route("/:id/start", post(start_route))
        .route("/:id/stops/:stop_id/complete", post(complete_stop))
        .route("/:id/complete", post(complete_route))
}

async fn generate_routes(
    State(state): State<AppState>,
    Json(request): Json<GenerateRoutesRequest>,
) -> Result<Json<ApiResponse<PlanningOutcome>>, AppError> {
    let controller = RouteController::new(&state);
    let response = controller.generate(request.date).await?;
    Ok(Json(response))
}

async fn regenerate_routes(
    State(state): State<AppState>,
    Json(request): Json<GenerateRoutesRequest>,
) -> Result<Json<ApiResponse<PlanningOutcome>>, AppError> {
    let controller = RouteController::new(&state);
    let response = controller.regenerate(request.date).await?;
    Ok(Json(response))
}

async fn clear_routes(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<ApiResponse<ClearRoutesResponse>>, AppError> {
    let controller = RouteController::new(&state);
    let response = controller.clear(query.date).await?;
    Ok(Json(response))
}

async fn list_routes(
    State(state): State<AppState>,
    Query(filter): Query<RouteFilter>,
) -> Result<Json<ApiResponse<Vec<Route>>>, AppError> {
    let controller = RouteController::new(&state);
    let response = controller.list(filter).await?;
    Ok(Json(response))
}

async fn get_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Route>>, AppError> {
    let controller = RouteController::new(&state);
    let response = controller.get(id).await?;
    Ok(Json(response))
}

async fn start_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StartRouteRequest>,
) -> Result<Json<ApiResponse<Route>>, AppError> {
    let controller = RouteController::new(&state);
    let response = controller.start(id, request.agent_id).await?;
    Ok(Json(response))
}

async fn complete_stop(
    State(state): State<AppState>,
    Path((id, stop_id)): Path<(Uuid, Uuid)>,
    request: Option<Json<CompleteStopRequest>>,
) -> Result<Json<ApiResponse<Route>>, AppError> {
    let request = request.map(|Json(request)| request).unwrap_or_default();
    let controller = RouteController::new(&state);
    let response = controller.complete_stop(id, stop_id, request).await?;
    Ok(Json(response))
}

async fn complete_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Option<Json<CompleteRouteRequest>>,
) -> Result<Json<ApiResponse<Route>>, AppError> {
    let request = request.map(|Json(request)| request).unwrap_or_default();
    let controller = RouteController::new(&state);
    let response = controller.complete(id, request).await?;
    Ok(Json(response))
}
