use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;
use validator::Validate;

use crate::dto::route_dto::{ClearRoutesResponse, CompleteRouteRequest, CompleteStopRequest};
use crate::dto::ApiResponse;
use crate::models::{Route, RouteFilter};
use crate::services::{PlanningOutcome, RouteExecutionService, RoutePlanningService};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct RouteController {
    planning: Arc<RoutePlanningService>,
    execution: Arc<RouteExecutionService>,
}

impl RouteController {
    pub fn new(state: &AppState) -> Self {
        Self {
            planning: state.planning.clone(),
            execution: state.execution.clone(),
        }
    }

    pub async fn generate(&self, date: NaiveDate) -> Result<ApiResponse<PlanningOutcome>, AppError> {
        let outcome = self.planning.generate_routes(date).await?;
        Ok(Self::outcome_response(date, outcome))
    }

    pub async fn regenerate(&self, date: NaiveDate) -> Result<ApiResponse<PlanningOutcome>, AppError> {
        let outcome = self.planning.regenerate_routes(date).await?;
        Ok(Self::outcome_response(date, outcome))
    }

    pub async fn clear(&self, date: NaiveDate) -> Result<ApiResponse<ClearRoutesResponse>, AppError> {
        let deleted = self.planning.clear_routes(date).await?;
        Ok(ApiResponse::success_with_message(
            ClearRoutesResponse { date, deleted },
            format!("{} rutas borradas", deleted),
        ))
    }

    pub async fn list(&self, filter: RouteFilter) -> Result<ApiResponse<Vec<Route>>, AppError> {
        let routes = self.planning.list_routes(&filter).await?;
        Ok(ApiResponse::success(routes))
    }

    pub async fn get(&self, id: Uuid) -> Result<ApiResponse<Route>, AppError> {
        let route = self.planning.get_route(id).await?;
        Ok(ApiResponse::success(route))
    }

    pub async fn start(&self, id: Uuid, agent_id: Uuid) -> Result<ApiResponse<Route>, AppError> {
        let route = self.execution.start_route(id, agent_id).await?;
        Ok(ApiResponse::success_with_message(route, "Ruta iniciada"))
    }

    pub async fn complete_stop(
        &self,
        id: Uuid,
        stop_id: Uuid,
        request: CompleteStopRequest,
    ) -> Result<ApiResponse<Route>, AppError> {
        request.validate()?;
        let route = self.execution.complete_stop(id, stop_id, request.into()).await?;
        Ok(ApiResponse::success_with_message(route, "Parada completada"))
    }

    pub async fn complete(&self, id: Uuid, request: CompleteRouteRequest) -> Result<ApiResponse<Route>, AppError> {
        request.validate()?;
        let forced = request.admin_id.is_some();
        let route = self.execution.complete_route(id, request.admin_override()).await?;

        let message = if forced { "Ruta cerrada por administrador" } else { "Ruta completada" };
        Ok(ApiResponse::success_with_message(route, message))
    }

    fn outcome_response(date: NaiveDate, outcome: PlanningOutcome) -> ApiResponse<PlanningOutcome> {
        let message = match &outcome {
            PlanningOutcome::Planned { routes, .. } => format!("{} rutas generadas para {}", routes.len(), date),
            PlanningOutcome::NoEligibleWork { .. } => format!("Nada que planificar para {}", date),
        };
        ApiResponse::success_with_message(outcome, message)
    }
}
