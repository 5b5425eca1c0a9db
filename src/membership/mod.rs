//! # Membership Lifecycle
//!
//! Member mutations of a gym: create, edit, renew and delete. Every mutation is
//! serialized per gym and leaves an automatic ledger entry behind. Ledger failures never
//! undo a member mutation; they are logged and counted.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::clock::Clock;
use crate::error::ServiceError;
use crate::gyms::fetch_gym;
use crate::ledger::LedgerRecorder;
use crate::models::ledger_entry::LedgerKind;
use crate::models::member::Model as MemberModel;
use crate::money;
use crate::repositories::{GymStore, MembershipStore};

pub mod locks;
pub mod status;

pub use locks::TenantLocks;
pub use status::{MemberStatus, days_remaining, member_status};

/// Longest accepted name or surname, in characters.
pub const NAME_MAX_CHARS: usize = 100;

/// Member fields supplied on create and edit.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberDraft {
    pub name: String,
    pub surname: String,
    #[serde(default)]
    pub email: Option<String>,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub is_daily_pass: bool,
    /// Days of access bought
    pub purchased_days: i32,
    /// Price paid
    #[schema(value_type = String, example = "25.00")]
    pub last_price: Decimal,
}

/// Renewal request: days added and price paid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct Renewal {
    pub days: i32,
    #[schema(value_type = String, example = "25.00")]
    pub price: Decimal,
}

/// How a renewal moved the expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalOutcome {
    /// The membership had lapsed; the new window starts now.
    Restarted,
    /// The membership was current; days are added to the existing expiry.
    Extended,
}

impl RenewalOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            RenewalOutcome::Restarted => "restarted",
            RenewalOutcome::Extended => "extended",
        }
    }
}

/// `start` plus `days` whole days; `None` past the representable date range.
pub fn expiry_after(start: DateTime<Utc>, days: i32) -> Option<DateTime<Utc>> {
    start.checked_add_signed(Duration::days(i64::from(days)))
}

/// New expiry for a renewal of `days` at `now`; `None` when it cannot be represented.
pub fn renewal_policy(
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
    days: i32,
) -> Option<(DateTime<Utc>, RenewalOutcome)> {
    if expires_at < now {
        expiry_after(now, days).map(|expiry| (expiry, RenewalOutcome::Restarted))
    } else {
        expiry_after(expires_at, days).map(|expiry| (expiry, RenewalOutcome::Extended))
    }
}

#[derive(Clone)]
pub struct MembershipManager {
    members: Arc<dyn MembershipStore>,
    gyms: Arc<dyn GymStore>,
    recorder: LedgerRecorder,
    clock: Arc<dyn Clock>,
    locks: TenantLocks,
}

impl MembershipManager {
    pub fn new(
        members: Arc<dyn MembershipStore>,
        gyms: Arc<dyn GymStore>,
        recorder: LedgerRecorder,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            members,
            gyms,
            recorder,
            clock,
            locks: TenantLocks::new(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn list(
        &self,
        caller: &CallerIdentity,
        gym_id: Uuid,
    ) -> Result<Vec<MemberModel>, ServiceError> {
        caller.require_gym(gym_id)?;
        Ok(self.members.list(gym_id).await?)
    }

    pub async fn get(
        &self,
        caller: &CallerIdentity,
        gym_id: Uuid,
        member_id: Uuid,
    ) -> Result<MemberModel, ServiceError> {
        caller.require_gym(gym_id)?;
        self.find(gym_id, member_id).await
    }

    #[instrument(skip_all, fields(gym_id = %gym_id))]
    pub async fn create(
        &self,
        caller: &CallerIdentity,
        gym_id: Uuid,
        draft: MemberDraft,
    ) -> Result<MemberModel, ServiceError> {
        caller.require_gym(gym_id)?;
        self.resolve_gym(gym_id).await?;
        let draft = validate_draft(draft)?;

        let _guard = self.lock_gym(gym_id).await;
        let now = self.clock.now();
        let expires_at = expiry_after(now, draft.purchased_days)
            .ok_or_else(|| ServiceError::validation("Purchased days are out of range"))?;
        let member = MemberModel {
            id: Uuid::new_v4(),
            gym_id,
            name: draft.name,
            surname: draft.surname,
            email: draft.email,
            phone: draft.phone,
            address: draft.address,
            is_daily_pass: draft.is_daily_pass,
            purchased_days: draft.purchased_days,
            last_price: draft.last_price,
            created_at: now,
            updated_at: now,
            expires_at,
        };

        let member = self.members.upsert(member, None).await?;
        counter!("gym_members_created_total").increment(1);
        info!(member_id = %member.id, expires_at = %member.expires_at, "Created member");

        let message = format!("New member: {}", member.full_name());
        self.log_event(LedgerKind::MemberCreated, &member, Decimal::ZERO, message)
            .await;
        Ok(member)
    }

    /// Overwrites display fields, days and price. The expiry is left as it was.
    #[instrument(skip_all, fields(gym_id = %gym_id, member_id = %member_id))]
    pub async fn edit(
        &self,
        caller: &CallerIdentity,
        gym_id: Uuid,
        member_id: Uuid,
        draft: MemberDraft,
    ) -> Result<MemberModel, ServiceError> {
        caller.require_gym(gym_id)?;
        let _guard = self.lock_gym(gym_id).await;

        let current = self.find(gym_id, member_id).await?;
        let draft = validate_draft(draft)?;
        let expected = current.updated_at;

        let edited = MemberModel {
            name: draft.name,
            surname: draft.surname,
            email: draft.email,
            phone: draft.phone,
            address: draft.address,
            is_daily_pass: draft.is_daily_pass,
            purchased_days: draft.purchased_days,
            last_price: draft.last_price,
            updated_at: self.clock.now(),
            ..current
        };

        let member = self.members.upsert(edited, Some(expected)).await?;
        info!("Edited member");

        let message = format!("Member edited: {}", member.full_name());
        self.log_event(LedgerKind::MemberEdited, &member, Decimal::ZERO, message)
            .await;
        Ok(member)
    }

    /// Restarts a lapsed membership from now, or extends a current one from its expiry.
    #[instrument(skip_all, fields(gym_id = %gym_id, member_id = %member_id))]
    pub async fn renew(
        &self,
        caller: &CallerIdentity,
        gym_id: Uuid,
        member_id: Uuid,
        renewal: Renewal,
    ) -> Result<MemberModel, ServiceError> {
        caller.require_gym(gym_id)?;
        if renewal.days <= 0 {
            return Err(ServiceError::validation(
                "Renewal days must be greater than zero",
            ));
        }
        if renewal.price < Decimal::ZERO {
            return Err(ServiceError::validation("Renewal price cannot be negative"));
        }
        let price = money::validated(renewal.price, "Renewal price")?;

        let _guard = self.lock_gym(gym_id).await;
        let current = self.find(gym_id, member_id).await?;
        let now = self.clock.now();
        let (expires_at, outcome) = renewal_policy(current.expires_at, now, renewal.days)
            .ok_or_else(|| ServiceError::validation("Renewal days are out of range"))?;
        let expected = current.updated_at;

        let renewed = MemberModel {
            purchased_days: renewal.days,
            last_price: price,
            expires_at,
            updated_at: now,
            ..current
        };

        let member = self.members.upsert(renewed, Some(expected)).await?;
        counter!("gym_member_renewals_total", "outcome" => outcome.as_str()).increment(1);
        info!(outcome = outcome.as_str(), expires_at = %member.expires_at, "Renewed member");

        let message = format!(
            "Membership renewed: {} ({} days)",
            member.full_name(),
            renewal.days
        );
        self.log_event(LedgerKind::MemberRenewed, &member, price, message)
            .await;
        Ok(member)
    }

    /// Records the deletion in the ledger, then removes the member. Ledger history of the
    /// member is kept.
    #[instrument(skip_all, fields(gym_id = %gym_id, member_id = %member_id))]
    pub async fn delete(
        &self,
        caller: &CallerIdentity,
        gym_id: Uuid,
        member_id: Uuid,
    ) -> Result<(), ServiceError> {
        caller.require_gym(gym_id)?;
        let _guard = self.lock_gym(gym_id).await;
        let member = self.find(gym_id, member_id).await?;

        let message = format!("Member deleted: {}", member.full_name());
        self.log_event(LedgerKind::MemberDeleted, &member, Decimal::ZERO, message)
            .await;

        self.members.delete(gym_id, member_id).await?;
        info!("Deleted member");
        Ok(())
    }

    /// Fails with [`ServiceError::NotFound`] unless the gym exists.
    pub(crate) async fn resolve_gym(&self, gym_id: Uuid) -> Result<(), ServiceError> {
        fetch_gym(self.gyms.as_ref(), gym_id).await.map(|_| ())
    }

    pub(crate) fn store(&self) -> &Arc<dyn MembershipStore> {
        &self.members
    }

    pub(crate) async fn lock_gym(&self, gym_id: Uuid) -> OwnedMutexGuard<()> {
        self.locks.lock(gym_id).await
    }

    /// Appends an automatic ledger entry, swallowing failures.
    pub(crate) async fn log_event(
        &self,
        kind: LedgerKind,
        member: &MemberModel,
        amount: Decimal,
        message: String,
    ) {
        if let Err(error) = self
            .recorder
            .record_member_event(kind, member, amount, message)
            .await
        {
            counter!("gym_ledger_autolog_failures_total").increment(1);
            warn!(
                gym_id = %member.gym_id,
                member_id = %member.id,
                kind = ?kind,
                error = %error,
                "Failed to record member event in ledger"
            );
        }
    }

    async fn find(&self, gym_id: Uuid, member_id: Uuid) -> Result<MemberModel, ServiceError> {
        self.members
            .get(gym_id, member_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Member {member_id} not found")))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Create/edit validation; the first failing rule wins.
fn validate_draft(draft: MemberDraft) -> Result<MemberDraft, ServiceError> {
    let name = draft.name.trim().to_string();
    let surname = draft.surname.trim().to_string();
    if name.is_empty() || surname.is_empty() {
        return Err(ServiceError::validation("Name and surname are required"));
    }
    if name.chars().count() > NAME_MAX_CHARS || surname.chars().count() > NAME_MAX_CHARS {
        return Err(ServiceError::validation(format!(
            "Name and surname cannot exceed {NAME_MAX_CHARS} characters"
        )));
    }

    let phone = draft.phone.trim().to_string();
    if phone.is_empty() {
        return Err(ServiceError::validation("Phone is required"));
    }

    if draft.purchased_days <= 0 {
        return Err(ServiceError::validation(
            "Purchased days must be greater than zero",
        ));
    }

    let last_price = money::validated(draft.last_price, "Price")?;
    if last_price <= Decimal::ZERO {
        return Err(ServiceError::validation("Price must be greater than zero"));
    }

    Ok(MemberDraft {
        name,
        surname,
        email: non_blank(draft.email),
        phone,
        address: non_blank(draft.address),
        last_price,
        ..draft
    })
}
