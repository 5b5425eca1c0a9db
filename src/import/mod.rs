//! # Import Reconciler
//!
//! Bulk member import from raw tabular rows. Rows are processed in order and
//! independently: a bad row is reported and the rest carry on. Members already in the gym
//! (and names accepted earlier in the same batch) are skipped by exact (name, surname).

use std::collections::HashSet;

use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::config::MembershipConfig;
use crate::error::ServiceError;
use crate::membership::{MembershipManager, expiry_after};
use crate::models::ledger_entry::LedgerKind;
use crate::models::member::Model as MemberModel;
use crate::money;

/// One uploaded row, all fields as raw strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RawImportRow {
    pub name: String,
    pub surname: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub days: Option<String>,
    pub price: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportedMember {
    /// 1-based position of the row in the batch
    pub row: usize,
    pub member_id: Uuid,
    pub name: String,
    pub surname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SkippedRow {
    pub row: usize,
    pub name: String,
    pub surname: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

/// Outcome of one import call. Partial success is normal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ImportReport {
    pub created_count: usize,
    pub skipped_count: usize,
    pub error_count: usize,
    pub created: Vec<ImportedMember>,
    pub skipped: Vec<SkippedRow>,
    pub errors: Vec<RowError>,
}

impl ImportReport {
    fn created(&mut self, row: usize, member: &MemberModel) {
        self.created.push(ImportedMember {
            row,
            member_id: member.id,
            name: member.name.clone(),
            surname: member.surname.clone(),
        });
        self.created_count += 1;
    }

    fn skipped(&mut self, row: usize, name: String, surname: String) {
        self.skipped.push(SkippedRow {
            row,
            name,
            surname,
            reason: "A member with this name and surname already exists".to_string(),
        });
        self.skipped_count += 1;
    }

    fn failed(&mut self, row: usize, message: impl Into<String>) {
        self.errors.push(RowError {
            row,
            message: message.into(),
        });
        self.error_count += 1;
    }
}

/// Tracks (name, surname) pairs already present in the gym or accepted in this batch.
#[derive(Debug, Default)]
struct DuplicateChecker {
    seen: HashSet<(String, String)>,
}

impl DuplicateChecker {
    fn from_members(members: &[MemberModel]) -> Self {
        Self {
            seen: members
                .iter()
                .map(|member| (member.name.clone(), member.surname.clone()))
                .collect(),
        }
    }

    fn contains(&self, name: &str, surname: &str) -> bool {
        self.seen.contains(&(name.to_string(), surname.to_string()))
    }

    fn insert(&mut self, name: &str, surname: &str) {
        self.seen.insert((name.to_string(), surname.to_string()));
    }
}

#[derive(Clone)]
pub struct ImportReconciler {
    manager: MembershipManager,
    config: MembershipConfig,
}

impl ImportReconciler {
    pub fn new(manager: MembershipManager, config: MembershipConfig) -> Self {
        Self { manager, config }
    }

    /// Imports `rows` into the gym. The whole batch runs under the gym's mutation lock.
    #[instrument(skip_all, fields(gym_id = %gym_id, rows = rows.len()))]
    pub async fn import(
        &self,
        caller: &CallerIdentity,
        gym_id: Uuid,
        rows: Vec<RawImportRow>,
    ) -> Result<ImportReport, ServiceError> {
        caller.require_gym(gym_id)?;
        self.manager.resolve_gym(gym_id).await?;
        if rows.len() > self.config.import_max_rows {
            return Err(ServiceError::validation(format!(
                "Import has {} rows; at most {} are accepted",
                rows.len(),
                self.config.import_max_rows
            )));
        }

        let _guard = self.manager.lock_gym(gym_id).await;
        let store = self.manager.store();
        let mut duplicates = DuplicateChecker::from_members(&store.list(gym_id).await?);
        let mut report = ImportReport::default();

        for (index, raw) in rows.into_iter().enumerate() {
            let row = index + 1;
            let name = raw.name.trim().to_string();
            let surname = raw.surname.trim().to_string();

            if name.is_empty() || surname.is_empty() {
                counter!("gym_import_rows_total", "result" => "error").increment(1);
                report.failed(row, "Name and surname are required");
                continue;
            }

            if duplicates.contains(&name, &surname) {
                counter!("gym_import_rows_total", "result" => "skipped").increment(1);
                report.skipped(row, name, surname);
                continue;
            }

            let member = match self.member_from_row(gym_id, name, surname, raw) {
                Ok(member) => member,
                Err(message) => {
                    counter!("gym_import_rows_total", "result" => "error").increment(1);
                    report.failed(row, message);
                    continue;
                }
            };
            match store.upsert(member, None).await {
                Ok(member) => {
                    counter!("gym_import_rows_total", "result" => "created").increment(1);
                    duplicates.insert(&member.name, &member.surname);
                    report.created(row, &member);

                    let message = format!("New member (import): {}", member.full_name());
                    self.manager
                        .log_event(LedgerKind::MemberCreated, &member, Decimal::ZERO, message)
                        .await;
                }
                Err(error) => {
                    counter!("gym_import_rows_total", "result" => "error").increment(1);
                    warn!(row, error = %error, "Failed to store imported member");
                    report.failed(row, format!("Failed to store member: {error}"));
                }
            }
        }

        info!(
            created = report.created_count,
            skipped = report.skipped_count,
            errors = report.error_count,
            "Import finished"
        );
        Ok(report)
    }

    /// Builds the member for an accepted row; `Err` carries the row error message.
    fn member_from_row(
        &self,
        gym_id: Uuid,
        name: String,
        surname: String,
        raw: RawImportRow,
    ) -> Result<MemberModel, &'static str> {
        let now = self.manager.now();
        let days = self.parse_days(raw.days.as_deref());
        let expires_at = expiry_after(now, days).ok_or("Days are out of range")?;
        let last_price = parse_price(raw.price.as_deref())?;

        Ok(MemberModel {
            id: Uuid::new_v4(),
            gym_id,
            name,
            surname,
            email: trimmed(raw.email),
            phone: trimmed(raw.phone).unwrap_or_default(),
            address: trimmed(raw.address),
            is_daily_pass: false,
            purchased_days: days,
            last_price,
            created_at: now,
            updated_at: now,
            expires_at,
        })
    }

    fn parse_days(&self, raw: Option<&str>) -> i32 {
        raw.and_then(|value| value.trim().parse::<i32>().ok())
            .filter(|days| *days > 0)
            .unwrap_or(self.config.import_default_days)
    }
}

/// Missing, non-numeric or negative prices import as zero. Prices too large to store
/// are a row error.
fn parse_price(raw: Option<&str>) -> Result<Decimal, &'static str> {
    match raw
        .and_then(|value| value.trim().parse::<Decimal>().ok())
        .filter(|price| *price >= Decimal::ZERO)
    {
        Some(price) => money::to_cents(price).ok_or("Price is out of range"),
        None => Ok(Decimal::ZERO),
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
