//! # Gym Handlers
//!
//! Administration of gym records. Creating, listing, re-planning and deleting gyms is
//! reserved to administrators; a gym's staff may read and update their own record.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{CallerIdentity, GymHeader};
use crate::error::ApiError;
use crate::gyms::{GymDetails, NewGym};
use crate::models::gym::{GymPlan, GymResponse};
use crate::server::AppState;

/// Request body for switching a gym's plan
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetPlanRequest {
    pub plan: GymPlan,
}

/// Register a new gym (starts on the trial plan)
#[utoipa::path(
    post,
    path = "/api/v1/gyms",
    security(("bearer_auth" = [])),
    request_body = NewGym,
    responses(
        (status = 201, description = "Gym created", body = GymResponse),
        (status = 400, description = "Invalid gym details", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Administrator access required", body = ApiError)
    ),
    tag = "gyms"
)]
pub async fn create_gym(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(request): Json<NewGym>,
) -> Result<impl IntoResponse, ApiError> {
    let gym = state.gyms.create(&caller, request).await?;
    let location = format!("/api/v1/gyms/{}", gym.id);

    Ok((
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(GymResponse::from(gym)),
    ))
}

/// List all gyms, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/gyms",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Gyms", body = Vec<GymResponse>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Administrator access required", body = ApiError)
    ),
    tag = "gyms"
)]
pub async fn list_gyms(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<GymResponse>>, ApiError> {
    let gyms = state.gyms.list(&caller).await?;
    Ok(Json(gyms.into_iter().map(GymResponse::from).collect()))
}

/// Get a gym by ID
#[utoipa::path(
    get,
    path = "/api/v1/gyms/{gym_id}",
    security(("bearer_auth" = [])),
    params(
        ("gym_id" = Uuid, Path, description = "Gym UUID"),
        GymHeader
    ),
    responses(
        (status = 200, description = "Gym", body = GymResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Gym outside the caller's scope", body = ApiError),
        (status = 404, description = "Gym not found", body = ApiError)
    ),
    tag = "gyms"
)]
pub async fn get_gym(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(gym_id): Path<Uuid>,
) -> Result<Json<GymResponse>, ApiError> {
    let gym = state.gyms.get(&caller, gym_id).await?;
    Ok(Json(gym.into()))
}

/// Update a gym's display and contact details
#[utoipa::path(
    put,
    path = "/api/v1/gyms/{gym_id}",
    security(("bearer_auth" = [])),
    params(
        ("gym_id" = Uuid, Path, description = "Gym UUID"),
        GymHeader
    ),
    request_body = GymDetails,
    responses(
        (status = 200, description = "Gym updated", body = GymResponse),
        (status = 400, description = "Invalid gym details", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Gym outside the caller's scope", body = ApiError),
        (status = 404, description = "Gym not found", body = ApiError)
    ),
    tag = "gyms"
)]
pub async fn update_gym(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(gym_id): Path<Uuid>,
    Json(details): Json<GymDetails>,
) -> Result<Json<GymResponse>, ApiError> {
    let gym = state.gyms.update(&caller, gym_id, details).await?;
    Ok(Json(gym.into()))
}

/// Switch a gym between the paid and trial plans
#[utoipa::path(
    put,
    path = "/api/v1/gyms/{gym_id}/plan",
    security(("bearer_auth" = [])),
    params(("gym_id" = Uuid, Path, description = "Gym UUID")),
    request_body = SetPlanRequest,
    responses(
        (status = 200, description = "Plan changed", body = GymResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Administrator access required", body = ApiError),
        (status = 404, description = "Gym not found", body = ApiError)
    ),
    tag = "gyms"
)]
pub async fn set_gym_plan(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(gym_id): Path<Uuid>,
    Json(request): Json<SetPlanRequest>,
) -> Result<Json<GymResponse>, ApiError> {
    let gym = state.gyms.set_plan(&caller, gym_id, request.plan).await?;
    Ok(Json(gym.into()))
}

/// Delete a gym that has no members
#[utoipa::path(
    delete,
    path = "/api/v1/gyms/{gym_id}",
    security(("bearer_auth" = [])),
    params(("gym_id" = Uuid, Path, description = "Gym UUID")),
    responses(
        (status = 204, description = "Gym deleted"),
        (status = 400, description = "Gym still has members", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Administrator access required", body = ApiError),
        (status = 404, description = "Gym not found", body = ApiError)
    ),
    tag = "gyms"
)]
pub async fn delete_gym(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(gym_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.gyms.delete(&caller, gym_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
