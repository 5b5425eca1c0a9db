//! # Ledger Handlers
//!
//! Manual income and expense entries and the gym's ledger history.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::auth::{CallerIdentity, GymHeader};
use crate::error::ApiError;
use crate::ledger::{LedgerEdit, ManualEntry};
use crate::models::ledger_entry::LedgerEntryResponse;
use crate::server::AppState;

/// List ledger entries, newest first
#[utoipa::path(
    get,
    path = "/api/v1/gyms/{gym_id}/ledger",
    security(("bearer_auth" = [])),
    params(
        ("gym_id" = Uuid, Path, description = "Gym UUID"),
        GymHeader
    ),
    responses(
        (status = 200, description = "Ledger entries", body = Vec<LedgerEntryResponse>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Gym outside the caller's scope", body = ApiError)
    ),
    tag = "ledger"
)]
pub async fn list_entries(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(gym_id): Path<Uuid>,
) -> Result<Json<Vec<LedgerEntryResponse>>, ApiError> {
    let entries = state.ledger.list(&caller, gym_id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// Record a manual entry; the sign of the amount decides income or expense
#[utoipa::path(
    post,
    path = "/api/v1/gyms/{gym_id}/ledger",
    security(("bearer_auth" = [])),
    params(
        ("gym_id" = Uuid, Path, description = "Gym UUID"),
        GymHeader
    ),
    request_body = ManualEntry,
    responses(
        (status = 201, description = "Entry recorded", body = LedgerEntryResponse),
        (status = 400, description = "Invalid entry", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Gym outside the caller's scope", body = ApiError)
    ),
    tag = "ledger"
)]
pub async fn record_entry(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(gym_id): Path<Uuid>,
    Json(entry): Json<ManualEntry>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state.ledger.record_manual(&caller, gym_id, entry).await?;
    let location = format!("/api/v1/gyms/{}/ledger/{}", gym_id, entry.id);

    Ok((
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(LedgerEntryResponse::from(entry)),
    ))
}

/// Get one ledger entry
#[utoipa::path(
    get,
    path = "/api/v1/gyms/{gym_id}/ledger/{entry_id}",
    security(("bearer_auth" = [])),
    params(
        ("gym_id" = Uuid, Path, description = "Gym UUID"),
        ("entry_id" = Uuid, Path, description = "Ledger entry UUID"),
        GymHeader
    ),
    responses(
        (status = 200, description = "Ledger entry", body = LedgerEntryResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Gym outside the caller's scope", body = ApiError),
        (status = 404, description = "Entry not found", body = ApiError)
    ),
    tag = "ledger"
)]
pub async fn get_entry(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path((gym_id, entry_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<LedgerEntryResponse>, ApiError> {
    let entry = state.ledger.get(&caller, gym_id, entry_id).await?;
    Ok(Json(entry.into()))
}

/// Edit the message or amount of a manual entry
#[utoipa::path(
    patch,
    path = "/api/v1/gyms/{gym_id}/ledger/{entry_id}",
    security(("bearer_auth" = [])),
    params(
        ("gym_id" = Uuid, Path, description = "Gym UUID"),
        ("entry_id" = Uuid, Path, description = "Ledger entry UUID"),
        GymHeader
    ),
    request_body = LedgerEdit,
    responses(
        (status = 200, description = "Entry updated", body = LedgerEntryResponse),
        (status = 400, description = "Invalid edit or automatic entry", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Gym outside the caller's scope", body = ApiError),
        (status = 404, description = "Entry not found", body = ApiError)
    ),
    tag = "ledger"
)]
pub async fn edit_entry(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path((gym_id, entry_id)): Path<(Uuid, Uuid)>,
    Json(edit): Json<LedgerEdit>,
) -> Result<Json<LedgerEntryResponse>, ApiError> {
    let entry = state.ledger.edit(&caller, gym_id, entry_id, edit).await?;
    Ok(Json(entry.into()))
}

/// Delete a ledger entry
#[utoipa::path(
    delete,
    path = "/api/v1/gyms/{gym_id}/ledger/{entry_id}",
    security(("bearer_auth" = [])),
    params(
        ("gym_id" = Uuid, Path, description = "Gym UUID"),
        ("entry_id" = Uuid, Path, description = "Ledger entry UUID"),
        GymHeader
    ),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Gym outside the caller's scope", body = ApiError),
        (status = 404, description = "Entry not found", body = ApiError)
    ),
    tag = "ledger"
)]
pub async fn delete_entry(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path((gym_id, entry_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state.ledger.delete(&caller, gym_id, entry_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
