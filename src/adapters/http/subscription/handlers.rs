//! HTTP handlers for subscription plan endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::adapters::http::error::{parse_id, ApiError};
use crate::adapters::http::state::AppState;
use crate::application::handlers::catalog::{
    CreatePlanCommand, DeletePlanCommand, GetPlanQuery, UpdatePlanCommand,
};

use super::dto::{CreatePlanRequest, DeletePlanResponse, PlanEnvelope, PlanListResponse, UpdatePlanRequest};

/// GET /api/subscription - List all plans
pub async fn list_plans(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let plans = state.list_plans_handler().handle().await?;
    Ok(Json(PlanListResponse::from(plans)))
}

/// GET /api/subscription/:id
pub async fn get_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let query = GetPlanQuery {
        plan_id: parse_id("id", &plan_id)?,
    };
    let plan = state.get_plan_handler().handle(query).await?;
    Ok(Json(PlanEnvelope::new(plan)))
}

/// POST /api/subscription - Create a plan
pub async fn create_plan(
    State(state): State<AppState>,
    payload: Result<Json<CreatePlanRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let cmd = CreatePlanCommand {
        name: request.name,
        duration: request.duration,
        price: request.price,
        renewal_type: request.renewal_type,
    };
    let plan = state.create_plan_handler().handle(cmd).await?;
    Ok((StatusCode::CREATED, Json(PlanEnvelope::new(plan))))
}

/// PUT /api/subscription/:id - Partially update a plan
pub async fn update_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
    payload: Result<Json<UpdatePlanRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let cmd = UpdatePlanCommand {
        plan_id: parse_id("id", &plan_id)?,
        name: request.name,
        duration: request.duration,
        price: request.price,
        renewal_type: request.renewal_type,
    };
    let plan = state.update_plan_handler().handle(cmd).await?;
    Ok(Json(PlanEnvelope::new(plan)))
}

/// DELETE /api/subscription/:id - Delete a plan and detach it from accounts
pub async fn delete_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = DeletePlanCommand {
        plan_id: parse_id("id", &plan_id)?,
    };
    let result = state.delete_plan_handler().handle(cmd).await?;
    Ok(Json(DeletePlanResponse::from(result)))
}
