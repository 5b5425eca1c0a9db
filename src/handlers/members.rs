//! # Member Handlers
//!
//! Member lifecycle endpoints scoped to one gym, plus CSV import and export.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::auth::{CallerIdentity, GymHeader};
use crate::error::{ApiError, validation_error};
use crate::import::ImportReport;
use crate::membership::{MemberDraft, Renewal};
use crate::models::member::MemberResponse;
use crate::server::AppState;
use crate::tabular::{self, TabularError};

/// Columns of the member export, in order.
const EXPORT_HEADERS: [&str; 12] = [
    "name",
    "surname",
    "email",
    "phone",
    "address",
    "is_daily_pass",
    "purchased_days",
    "last_price",
    "created_at",
    "expires_at",
    "status",
    "days_remaining",
];

/// List a gym's members with derived status
#[utoipa::path(
    get,
    path = "/api/v1/gyms/{gym_id}/members",
    security(("bearer_auth" = [])),
    params(
        ("gym_id" = Uuid, Path, description = "Gym UUID"),
        GymHeader
    ),
    responses(
        (status = 200, description = "Members ordered by surname then name", body = Vec<MemberResponse>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Gym outside the caller's scope", body = ApiError)
    ),
    tag = "members"
)]
pub async fn list_members(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(gym_id): Path<Uuid>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let members = state.members.list(&caller, gym_id).await?;
    let now = state.members.now();

    Ok(Json(
        members
            .into_iter()
            .map(|member| MemberResponse::at(member, now))
            .collect(),
    ))
}

/// Get one member
#[utoipa::path(
    get,
    path = "/api/v1/gyms/{gym_id}/members/{member_id}",
    security(("bearer_auth" = [])),
    params(
        ("gym_id" = Uuid, Path, description = "Gym UUID"),
        ("member_id" = Uuid, Path, description = "Member UUID"),
        GymHeader
    ),
    responses(
        (status = 200, description = "Member", body = MemberResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Gym outside the caller's scope", body = ApiError),
        (status = 404, description = "Member not found", body = ApiError)
    ),
    tag = "members"
)]
pub async fn get_member(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path((gym_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = state.members.get(&caller, gym_id, member_id).await?;
    Ok(Json(MemberResponse::at(member, state.members.now())))
}

/// Register a member; access runs from now for the purchased days
#[utoipa::path(
    post,
    path = "/api/v1/gyms/{gym_id}/members",
    security(("bearer_auth" = [])),
    params(
        ("gym_id" = Uuid, Path, description = "Gym UUID"),
        GymHeader
    ),
    request_body = MemberDraft,
    responses(
        (status = 201, description = "Member created", body = MemberResponse),
        (status = 400, description = "Invalid member fields", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Gym outside the caller's scope", body = ApiError)
    ),
    tag = "members"
)]
pub async fn create_member(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(gym_id): Path<Uuid>,
    Json(draft): Json<MemberDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let member = state.members.create(&caller, gym_id, draft).await?;
    let location = format!("/api/v1/gyms/{}/members/{}", gym_id, member.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(MemberResponse::at(member, state.members.now())),
    ))
}

/// Edit a member's fields; the expiry date is left untouched
#[utoipa::path(
    put,
    path = "/api/v1/gyms/{gym_id}/members/{member_id}",
    security(("bearer_auth" = [])),
    params(
        ("gym_id" = Uuid, Path, description = "Gym UUID"),
        ("member_id" = Uuid, Path, description = "Member UUID"),
        GymHeader
    ),
    request_body = MemberDraft,
    responses(
        (status = 200, description = "Member updated", body = MemberResponse),
        (status = 400, description = "Invalid member fields", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Gym outside the caller's scope", body = ApiError),
        (status = 404, description = "Member not found", body = ApiError),
        (status = 409, description = "Member changed concurrently", body = ApiError)
    ),
    tag = "members"
)]
pub async fn edit_member(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path((gym_id, member_id)): Path<(Uuid, Uuid)>,
    Json(draft): Json<MemberDraft>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = state.members.edit(&caller, gym_id, member_id, draft).await?;
    Ok(Json(MemberResponse::at(member, state.members.now())))
}

/// Renew a membership, restarting it if lapsed or extending it otherwise
#[utoipa::path(
    post,
    path = "/api/v1/gyms/{gym_id}/members/{member_id}/renew",
    security(("bearer_auth" = [])),
    params(
        ("gym_id" = Uuid, Path, description = "Gym UUID"),
        ("member_id" = Uuid, Path, description = "Member UUID"),
        GymHeader
    ),
    request_body = Renewal,
    responses(
        (status = 200, description = "Membership renewed", body = MemberResponse),
        (status = 400, description = "Invalid renewal", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Gym outside the caller's scope", body = ApiError),
        (status = 404, description = "Member not found", body = ApiError),
        (status = 409, description = "Member changed concurrently", body = ApiError)
    ),
    tag = "members"
)]
pub async fn renew_member(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path((gym_id, member_id)): Path<(Uuid, Uuid)>,
    Json(renewal): Json<Renewal>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = state
        .members
        .renew(&caller, gym_id, member_id, renewal)
        .await?;
    Ok(Json(MemberResponse::at(member, state.members.now())))
}

/// Delete a member; its ledger history is kept
#[utoipa::path(
    delete,
    path = "/api/v1/gyms/{gym_id}/members/{member_id}",
    security(("bearer_auth" = [])),
    params(
        ("gym_id" = Uuid, Path, description = "Gym UUID"),
        ("member_id" = Uuid, Path, description = "Member UUID"),
        GymHeader
    ),
    responses(
        (status = 204, description = "Member deleted"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Gym outside the caller's scope", body = ApiError),
        (status = 404, description = "Member not found", body = ApiError)
    ),
    tag = "members"
)]
pub async fn delete_member(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path((gym_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state.members.delete(&caller, gym_id, member_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Bulk import members from a CSV body
///
/// Headers `name` and `surname` are required; `email`, `phone`, `address`, `days` and
/// `price` are optional. Rows are reconciled independently and the report lists what
/// was created, skipped as duplicate, or rejected.
#[utoipa::path(
    post,
    path = "/api/v1/gyms/{gym_id}/members/import",
    security(("bearer_auth" = [])),
    params(
        ("gym_id" = Uuid, Path, description = "Gym UUID"),
        GymHeader
    ),
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Import report", body = ImportReport),
        (status = 400, description = "Unreadable CSV or too many rows", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Gym outside the caller's scope", body = ApiError)
    ),
    tag = "members"
)]
pub async fn import_members(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(gym_id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<ImportReport>, ApiError> {
    // Scope is checked before the upload is parsed
    caller.require_gym(gym_id)?;

    let rows = tabular::parse_member_rows(&body, state.config.membership.import_max_rows)
        .map_err(csv_rejected)?;
    let report = state.imports.import(&caller, gym_id, rows).await?;
    Ok(Json(report))
}

/// Export a gym's members as CSV
#[utoipa::path(
    get,
    path = "/api/v1/gyms/{gym_id}/members/export",
    security(("bearer_auth" = [])),
    params(
        ("gym_id" = Uuid, Path, description = "Gym UUID"),
        GymHeader
    ),
    responses(
        (status = 200, description = "Member roster", body = String, content_type = "text/csv"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Gym outside the caller's scope", body = ApiError)
    ),
    tag = "members"
)]
pub async fn export_members(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(gym_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let members = state.members.list(&caller, gym_id).await?;
    let now = state.members.now();

    let rows = members.into_iter().map(|member| {
        let view = MemberResponse::at(member, now);
        [
            view.name,
            view.surname,
            view.email.unwrap_or_default(),
            view.phone,
            view.address.unwrap_or_default(),
            view.is_daily_pass.to_string(),
            view.purchased_days.to_string(),
            view.last_price.to_string(),
            view.created_at.to_rfc3339(),
            view.expires_at.to_rfc3339(),
            view.status.as_str().to_string(),
            view.days_remaining.to_string(),
        ]
    });
    let csv = tabular::write_csv(&EXPORT_HEADERS, rows)
        .map_err(|error| anyhow::anyhow!("member export failed: {error}"))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"members-{gym_id}.csv\""),
            ),
        ],
        csv,
    ))
}

fn csv_rejected(error: TabularError) -> ApiError {
    let details = match &error {
        TabularError::MissingColumn(column) => serde_json::json!({ "column": column }),
        TabularError::TooManyRows { max } => serde_json::json!({ "max_rows": max }),
        other => serde_json::json!({ "reason": other.to_string() }),
    };
    validation_error(&format!("Invalid member CSV: {error}"), details)
}
