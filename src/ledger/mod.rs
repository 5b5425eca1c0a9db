//! # Ledger Recorder
//!
//! Appends manual income/expense entries and automatic member events to a gym's ledger.
//! Manual entries are classified by the sign of their amount; automatic entries keep the
//! kind they were recorded with and cannot be edited.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::clock::Clock;
use crate::error::ServiceError;
use crate::gyms::fetch_gym;
use crate::models::ledger_entry::{LedgerKind, Model as LedgerEntryModel};
use crate::models::member::Model as MemberModel;
use crate::money;
use crate::repositories::{GymStore, LedgerStore};

/// Longest accepted ledger message, in characters.
pub const MESSAGE_MAX_CHARS: usize = 300;

/// Longest frozen member name, in characters.
pub const MEMBER_NAME_MAX_CHARS: usize = 200;

/// Manual ledger entry input. Amounts are rounded to cents.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ManualEntry {
    /// Free-text description
    pub message: String,
    /// Positive for income, negative for expense
    #[schema(value_type = String, example = "-50.00")]
    pub amount: Decimal,
}

/// Changes to a manual ledger entry; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LedgerEdit {
    pub message: Option<String>,
    #[schema(value_type = Option<String>, example = "20.00")]
    pub amount: Option<Decimal>,
}

#[derive(Clone)]
pub struct LedgerRecorder {
    store: Arc<dyn LedgerStore>,
    gyms: Arc<dyn GymStore>,
    clock: Arc<dyn Clock>,
}

impl LedgerRecorder {
    pub fn new(store: Arc<dyn LedgerStore>, gyms: Arc<dyn GymStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, gyms, clock }
    }

    /// Sign classification for manual entries.
    pub fn classify(amount: Decimal) -> LedgerKind {
        LedgerKind::classify(amount)
    }

    #[instrument(skip_all, fields(gym_id = %gym_id))]
    pub async fn record_manual(
        &self,
        caller: &CallerIdentity,
        gym_id: Uuid,
        entry: ManualEntry,
    ) -> Result<LedgerEntryModel, ServiceError> {
        caller.require_gym(gym_id)?;
        fetch_gym(self.gyms.as_ref(), gym_id).await?;
        let message = validate_message(&entry.message)?;
        let amount = money::validated(entry.amount, "Amount")?;

        let kind = Self::classify(amount);
        let stored = self
            .store
            .append(LedgerEntryModel {
                id: Uuid::new_v4(),
                gym_id,
                message,
                amount,
                kind,
                member_id: None,
                member_name: None,
                occurred_at: self.clock.now(),
            })
            .await?;

        info!(entry_id = %stored.id, kind = ?stored.kind, "Recorded manual ledger entry");
        Ok(stored)
    }

    /// Appends an automatic entry about `member`. Callers have already checked scope.
    pub(crate) async fn record_member_event(
        &self,
        kind: LedgerKind,
        member: &MemberModel,
        amount: Decimal,
        message: String,
    ) -> Result<LedgerEntryModel, ServiceError> {
        let entry = LedgerEntryModel {
            id: Uuid::new_v4(),
            gym_id: member.gym_id,
            message: truncate_chars(&message, MESSAGE_MAX_CHARS),
            amount,
            kind,
            member_id: Some(member.id),
            member_name: Some(truncate_chars(&member.full_name(), MEMBER_NAME_MAX_CHARS)),
            occurred_at: self.clock.now(),
        };

        Ok(self.store.append(entry).await?)
    }

    /// Entries of the gym, newest first.
    pub async fn list(
        &self,
        caller: &CallerIdentity,
        gym_id: Uuid,
    ) -> Result<Vec<LedgerEntryModel>, ServiceError> {
        caller.require_gym(gym_id)?;
        Ok(self.store.list(gym_id).await?)
    }

    pub async fn get(
        &self,
        caller: &CallerIdentity,
        gym_id: Uuid,
        entry_id: Uuid,
    ) -> Result<LedgerEntryModel, ServiceError> {
        caller.require_gym(gym_id)?;
        self.store
            .get(gym_id, entry_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Ledger entry {entry_id} not found")))
    }

    /// Edits message and/or amount of a manual entry, re-deriving its kind.
    #[instrument(skip_all, fields(gym_id = %gym_id, entry_id = %entry_id))]
    pub async fn edit(
        &self,
        caller: &CallerIdentity,
        gym_id: Uuid,
        entry_id: Uuid,
        edit: LedgerEdit,
    ) -> Result<LedgerEntryModel, ServiceError> {
        let mut entry = self.get(caller, gym_id, entry_id).await?;

        if !entry.kind.is_manual() {
            return Err(ServiceError::validation(
                "Automatic ledger entries cannot be edited",
            ));
        }

        if let Some(message) = edit.message {
            entry.message = validate_message(&message)?;
        }
        if let Some(amount) = edit.amount {
            entry.amount = money::validated(amount, "Amount")?;
        }
        entry.kind = Self::classify(entry.amount);

        let updated = self.store.update(entry).await?;
        info!(kind = ?updated.kind, "Edited ledger entry");
        Ok(updated)
    }

    #[instrument(skip_all, fields(gym_id = %gym_id, entry_id = %entry_id))]
    pub async fn delete(
        &self,
        caller: &CallerIdentity,
        gym_id: Uuid,
        entry_id: Uuid,
    ) -> Result<(), ServiceError> {
        caller.require_gym(gym_id)?;
        self.store.delete(gym_id, entry_id).await?;
        info!("Deleted ledger entry");
        Ok(())
    }
}

fn validate_message(message: &str) -> Result<String, ServiceError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation("Ledger message cannot be empty"));
    }
    if trimmed.chars().count() > MESSAGE_MAX_CHARS {
        return Err(ServiceError::validation(format!(
            "Ledger message cannot exceed {MESSAGE_MAX_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::gym::Model as GymModel;
    use crate::repositories::InMemoryStore;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    struct Fixture {
        recorder: LedgerRecorder,
        clock: Arc<FixedClock>,
        gym_id: Uuid,
        caller: CallerIdentity,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(FixedClock::at_date(2025, 3, 1));
        let gym = GymModel::new_trial("Iron Temple", clock.now());
        let gym_id = gym.id;
        let store = Arc::new(InMemoryStore::with_gyms([gym]));

        Fixture {
            recorder: LedgerRecorder::new(store.clone(), store, clock.clone()),
            clock,
            gym_id,
            caller: CallerIdentity::Tenant(gym_id),
        }
    }

    fn expense(amount: Decimal) -> ManualEntry {
        ManualEntry {
            message: "Cleaning supplies".to_string(),
            amount,
        }
    }

    #[tokio::test]
    async fn edit_reclassifies_by_new_amount() {
        let f = fixture();

        let entry = f
            .recorder
            .record_manual(&f.caller, f.gym_id, expense(dec!(-50.00)))
            .await
            .unwrap();
        assert_eq!(entry.kind, LedgerKind::Expense);

        let edited = f
            .recorder
            .edit(
                &f.caller,
                f.gym_id,
                entry.id,
                LedgerEdit {
                    message: None,
                    amount: Some(dec!(20.00)),
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.kind, LedgerKind::Income);
        assert_eq!(edited.amount, dec!(20.00));
        assert_eq!(edited.message, "Cleaning supplies");
    }

    #[tokio::test]
    async fn zero_amount_is_income() {
        let f = fixture();

        let entry = f
            .recorder
            .record_manual(&f.caller, f.gym_id, expense(dec!(0)))
            .await
            .unwrap();
        assert_eq!(entry.kind, LedgerKind::Income);
    }

    #[tokio::test]
    async fn sub_cent_amounts_are_rounded_before_classifying() {
        let f = fixture();

        let entry = f
            .recorder
            .record_manual(&f.caller, f.gym_id, expense(dec!(10.005)))
            .await
            .unwrap();
        assert_eq!(entry.amount, dec!(10.01));
        assert_eq!(entry.kind, LedgerKind::Income);

        let rounded_away = f
            .recorder
            .record_manual(&f.caller, f.gym_id, expense(dec!(-0.004)))
            .await
            .unwrap();
        assert!(rounded_away.amount.is_zero());
        assert_eq!(rounded_away.kind, LedgerKind::Income);

        let edited = f
            .recorder
            .edit(
                &f.caller,
                f.gym_id,
                entry.id,
                LedgerEdit {
                    message: None,
                    amount: Some(dec!(-3.333)),
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.amount, dec!(-3.33));
        assert_eq!(edited.kind, LedgerKind::Expense);
    }

    #[tokio::test]
    async fn amounts_beyond_the_column_are_rejected() {
        let f = fixture();

        let result = f
            .recorder
            .record_manual(&f.caller, f.gym_id, expense(dec!(1000000000000)))
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));

        let entry = f
            .recorder
            .record_manual(&f.caller, f.gym_id, expense(dec!(-9999999999.99)))
            .await
            .unwrap();
        let result = f
            .recorder
            .edit(
                &f.caller,
                f.gym_id,
                entry.id,
                LedgerEdit {
                    message: None,
                    amount: Some(dec!(-10000000000)),
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn unknown_gym_is_not_found() {
        let f = fixture();
        let unknown = Uuid::new_v4();

        let result = f
            .recorder
            .record_manual(&CallerIdentity::Tenant(unknown), unknown, expense(dec!(5)))
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn message_is_validated() {
        let f = fixture();

        let blank = f
            .recorder
            .record_manual(
                &f.caller,
                f.gym_id,
                ManualEntry {
                    message: "   ".to_string(),
                    amount: dec!(10),
                },
            )
            .await;
        assert!(matches!(blank, Err(ServiceError::Validation(_))));

        let too_long = f
            .recorder
            .record_manual(
                &f.caller,
                f.gym_id,
                ManualEntry {
                    message: "x".repeat(MESSAGE_MAX_CHARS + 1),
                    amount: dec!(10),
                },
            )
            .await;
        assert!(matches!(too_long, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn automatic_entries_cannot_be_edited() {
        let f = fixture();
        let now = f.clock.now();
        let member = MemberModel {
            id: Uuid::new_v4(),
            gym_id: f.gym_id,
            name: "Ana".to_string(),
            surname: "Lopez".to_string(),
            email: None,
            phone: "555-0100".to_string(),
            address: None,
            is_daily_pass: false,
            purchased_days: 30,
            last_price: dec!(25),
            created_at: now,
            updated_at: now,
            expires_at: now + Duration::days(30),
        };

        let entry = f
            .recorder
            .record_member_event(
                LedgerKind::MemberRenewed,
                &member,
                dec!(25),
                "Membership renewed".to_string(),
            )
            .await
            .unwrap();
        assert_eq!(entry.kind, LedgerKind::MemberRenewed);
        assert_eq!(entry.member_name.as_deref(), Some("Ana Lopez"));

        let result = f
            .recorder
            .edit(
                &f.caller,
                f.gym_id,
                entry.id,
                LedgerEdit {
                    message: Some("changed".to_string()),
                    amount: None,
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_scoped() {
        let f = fixture();
        let other_gym = Uuid::new_v4();

        let first = f
            .recorder
            .record_manual(&f.caller, f.gym_id, expense(dec!(-5)))
            .await
            .unwrap();
        f.clock.advance(Duration::hours(1));
        let second = f
            .recorder
            .record_manual(&f.caller, f.gym_id, expense(dec!(7)))
            .await
            .unwrap();

        let entries = f.recorder.list(&f.caller, f.gym_id).await.unwrap();
        assert_eq!(
            entries.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );

        let foreign = f.recorder.list(&f.caller, other_gym).await;
        assert!(matches!(foreign, Err(ServiceError::Forbidden(_))));

        let other_caller = CallerIdentity::Tenant(other_gym);
        let missing = f.recorder.get(&other_caller, other_gym, first.id).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let f = fixture();

        let entry = f
            .recorder
            .record_manual(&f.caller, f.gym_id, expense(dec!(-5)))
            .await
            .unwrap();
        f.recorder.delete(&f.caller, f.gym_id, entry.id).await.unwrap();

        assert!(f.recorder.list(&f.caller, f.gym_id).await.unwrap().is_empty());
        assert!(matches!(
            f.recorder.delete(&f.caller, f.gym_id, entry.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
