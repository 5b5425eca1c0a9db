//! # Report Handlers

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use uuid::Uuid;

use crate::auth::{CallerIdentity, GymHeader};
use crate::error::ApiError;
use crate::reporting::{ChartPeriod, ChartSeries, DashboardSnapshot, SalesStatistics};
use crate::server::AppState;

/// Query parameters for the chart endpoint
#[derive(Debug, Clone, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChartQuery {
    /// Bucketing period; defaults to `week`
    #[param(example = "month")]
    pub period: Option<String>,
}

/// Dashboard snapshot for today
#[utoipa::path(
    get,
    path = "/api/v1/gyms/{gym_id}/reports/dashboard",
    security(("bearer_auth" = [])),
    params(
        ("gym_id" = Uuid, Path, description = "Gym UUID"),
        GymHeader
    ),
    responses(
        (status = 200, description = "Dashboard snapshot", body = DashboardSnapshot),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Gym outside the caller's scope", body = ApiError)
    ),
    tag = "reports"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(gym_id): Path<Uuid>,
) -> Result<Json<DashboardSnapshot>, ApiError> {
    Ok(Json(state.reports.dashboard(&caller, gym_id).await?))
}

/// Day, month-to-date and year-to-date sales
#[utoipa::path(
    get,
    path = "/api/v1/gyms/{gym_id}/reports/sales",
    security(("bearer_auth" = [])),
    params(
        ("gym_id" = Uuid, Path, description = "Gym UUID"),
        GymHeader
    ),
    responses(
        (status = 200, description = "Sales statistics", body = SalesStatistics),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Gym outside the caller's scope", body = ApiError)
    ),
    tag = "reports"
)]
pub async fn sales(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(gym_id): Path<Uuid>,
) -> Result<Json<SalesStatistics>, ApiError> {
    Ok(Json(state.reports.sales_stats(&caller, gym_id).await?))
}

/// Bucketed income and expense series
#[utoipa::path(
    get,
    path = "/api/v1/gyms/{gym_id}/reports/chart",
    security(("bearer_auth" = [])),
    params(
        ("gym_id" = Uuid, Path, description = "Gym UUID"),
        ChartQuery,
        GymHeader
    ),
    responses(
        (status = 200, description = "Chart series", body = ChartSeries),
        (status = 400, description = "Unknown period", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Gym outside the caller's scope", body = ApiError)
    ),
    tag = "reports"
)]
pub async fn chart(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(gym_id): Path<Uuid>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<ChartSeries>, ApiError> {
    let period = match query.period.as_deref() {
        None => ChartPeriod::Week,
        Some(raw) => raw.parse::<ChartPeriod>().map_err(|message| {
            crate::error::validation_error(
                "Invalid chart period",
                serde_json::json!({ "period": message }),
            )
        })?,
    };

    Ok(Json(state.reports.chart(&caller, gym_id, period).await?))
}
