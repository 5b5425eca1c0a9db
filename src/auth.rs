//! # Authentication and Authorization
//!
//! Resolves every request into a [`CallerIdentity`] and provides the scope checks the
//! services apply before touching gym data.
//!
//! Bearer tokens are matched against the configured admin tokens (platform
//! administrator) and service tokens (the trusted front end, which names the gym it
//! acts for in the `X-Gym-Id` header).

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiError, ServiceError, unauthorized, validation_error};

/// Header carrying the gym a service token acts for.
pub const GYM_HEADER: &str = "X-Gym-Id";

/// Who is calling. Passed explicitly into every service operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "gym_id", rename_all = "snake_case")]
pub enum CallerIdentity {
    Anonymous,
    /// Platform administrator; manages gym records only.
    Admin,
    /// Staff of one gym.
    Tenant(Uuid),
}

impl CallerIdentity {
    pub fn is_admin(&self) -> bool {
        matches!(self, CallerIdentity::Admin)
    }

    /// Member and ledger data: only the gym's own staff.
    pub fn require_gym(&self, gym_id: Uuid) -> Result<(), ServiceError> {
        match self {
            CallerIdentity::Tenant(own) if *own == gym_id => Ok(()),
            CallerIdentity::Tenant(_) => Err(ServiceError::forbidden(
                "Operation targets a gym outside the caller's scope",
            )),
            CallerIdentity::Admin => Err(ServiceError::forbidden(
                "Administrators cannot act on member or ledger data",
            )),
            CallerIdentity::Anonymous => Err(ServiceError::Unauthenticated),
        }
    }

    /// Gym record reads and display updates: the gym's own staff or an administrator.
    pub fn require_gym_or_admin(&self, gym_id: Uuid) -> Result<(), ServiceError> {
        match self {
            CallerIdentity::Admin => Ok(()),
            other => other.require_gym(gym_id),
        }
    }

    pub fn require_admin(&self) -> Result<(), ServiceError> {
        match self {
            CallerIdentity::Admin => Ok(()),
            CallerIdentity::Anonymous => Err(ServiceError::Unauthenticated),
            CallerIdentity::Tenant(_) => {
                Err(ServiceError::forbidden("Administrator access required"))
            }
        }
    }
}

/// Middleware that resolves the caller and stores it in request extensions.
///
/// A missing `Authorization` header yields [`CallerIdentity::Anonymous`]; handlers
/// reject it through the service scope checks. A present but invalid header is a 401.
pub async fn identity_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = resolve_identity(&config, request.headers())?;
    if let CallerIdentity::Tenant(gym_id) = identity {
        tracing::debug!(gym_id = %gym_id, "Authenticated gym request");
    }
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Maps request headers to a caller identity.
pub fn resolve_identity(config: &AppConfig, headers: &HeaderMap) -> Result<CallerIdentity, ApiError> {
    let Some(token) = extract_bearer_token(headers)? else {
        return Ok(CallerIdentity::Anonymous);
    };

    if token_matches(&config.admin_tokens, token) {
        return Ok(CallerIdentity::Admin);
    }

    if token_matches(&config.service_tokens, token) {
        return extract_gym_id(headers).map(CallerIdentity::Tenant);
    }

    Err(unauthorized(Some("Invalid bearer token")))
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let header = value
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?;

    header
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
}

fn token_matches(configured: &[String], token: &str) -> bool {
    configured
        .iter()
        .any(|candidate| ConstantTimeEq::ct_eq(token.as_bytes(), candidate.as_bytes()).into())
}

fn extract_gym_id(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let header_value = headers
        .get(GYM_HEADER)
        .ok_or_else(|| {
            validation_error(
                "Missing required header",
                serde_json::json!({ GYM_HEADER: "Required header is missing" }),
            )
        })?
        .to_str()
        .map_err(|_| {
            validation_error(
                "Invalid gym header",
                serde_json::json!({ GYM_HEADER: "Header must be valid UTF-8" }),
            )
        })?;

    header_value.parse::<Uuid>().map_err(|_| {
        validation_error(
            "Invalid gym ID",
            serde_json::json!({ GYM_HEADER: "Must be a valid UUID" }),
        )
    })
}

/// OpenAPI header parameter for X-Gym-Id
#[derive(Debug, Serialize, Deserialize, IntoParams, utoipa::ToSchema)]
#[into_params(parameter_in = Header)]
pub struct GymHeader {
    /// Gym identifier (UUID) the service token acts for
    #[serde(rename = "X-Gym-Id")]
    #[param(rename = "X-Gym-Id", value_type = String)]
    pub gym_id: String,
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CallerIdentity>()
            .copied()
            .unwrap_or(CallerIdentity::Anonymous))
    }
}
