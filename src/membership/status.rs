//! Status derivation from a member's expiry instant.
//!
//! Comparisons are by calendar date in UTC, so the time of day never changes a
//! member's status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Expired,
}

impl MemberStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Expired => "expired",
        }
    }
}

/// Active while the expiry date has not passed; the expiry day itself still counts.
pub fn member_status(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> MemberStatus {
    if expires_at.date_naive() >= now.date_naive() {
        MemberStatus::Active
    } else {
        MemberStatus::Expired
    }
}

/// Calendar days from today to the expiry date; negative once expired.
pub fn days_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expires_at.date_naive() - now.date_naive()).num_days()
}
