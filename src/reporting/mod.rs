//! # Reporting Engine
//!
//! Read-only aggregations over a gym's members and ledger: the dashboard snapshot, sales
//! statistics for the current day, month and year, and fixed-length chart series.
//!
//! Income figures that come from members use `last_price` of members touched in the
//! window. This approximates revenue (an edit counts as a sale) and is kept as is.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::clock::Clock;
use crate::error::ServiceError;
use crate::membership::MemberStatus;
use crate::models::ledger_entry::Model as LedgerEntryModel;
use crate::models::member::Model as MemberModel;
use crate::repositories::{LedgerStore, MembershipStore};

pub mod periods;

pub use periods::{Bucket, ChartPeriod, buckets};

/// Member shown in the dashboard's expiring-soon list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExpiringMember {
    pub member_id: Uuid,
    pub name: String,
    pub surname: String,
    pub phone: String,
    #[schema(value_type = String, example = "2025-01-31T12:00:00Z")]
    pub expires_at: DateTime<Utc>,
    pub days_remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DashboardSnapshot {
    pub total_members: usize,
    pub active_members: usize,
    pub expired_members: usize,
    pub new_today: usize,
    pub new_this_month: usize,
    /// Active members expiring within the configured window, soonest first
    pub expiring_soon: Vec<ExpiringMember>,
    #[schema(value_type = String, example = "150.00")]
    pub income_today: Decimal,
    #[schema(value_type = String, example = "2300.00")]
    pub income_this_month: Decimal,
}

/// Sales figures for one inclusive date window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SalesWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Sum of `last_price` of members created in the window
    #[schema(value_type = String)]
    pub signup_revenue: Decimal,
    /// Sum of positive ledger amounts in the window
    #[schema(value_type = String)]
    pub ledger_income: Decimal,
    #[schema(value_type = String)]
    pub total_income: Decimal,
    /// Sum of absolute negative ledger amounts in the window
    #[schema(value_type = String)]
    pub total_expense: Decimal,
    #[schema(value_type = String)]
    pub net: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SalesStatistics {
    pub day: SalesWindow,
    pub month: SalesWindow,
    pub year: SalesWindow,
}

/// Bucketed income and expense; all three arrays have the period's bucket count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChartSeries {
    pub period: ChartPeriod,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub labels: Vec<String>,
    #[schema(value_type = Vec<String>)]
    pub income: Vec<Decimal>,
    #[schema(value_type = Vec<String>)]
    pub expense: Vec<Decimal>,
}

/// Income and expense over an inclusive date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
}

#[derive(Clone)]
pub struct ReportingEngine {
    members: Arc<dyn MembershipStore>,
    ledger: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    expiring_soon_days: i64,
}

impl ReportingEngine {
    pub fn new(
        members: Arc<dyn MembershipStore>,
        ledger: Arc<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
        expiring_soon_days: i64,
    ) -> Self {
        Self {
            members,
            ledger,
            clock,
            expiring_soon_days,
        }
    }

    #[instrument(skip_all, fields(gym_id = %gym_id))]
    pub async fn dashboard(
        &self,
        caller: &CallerIdentity,
        gym_id: Uuid,
    ) -> Result<DashboardSnapshot, ServiceError> {
        caller.require_gym(gym_id)?;
        let members = self.members.list(gym_id).await?;
        Ok(dashboard_snapshot(
            &members,
            self.clock.now(),
            self.expiring_soon_days,
        ))
    }

    #[instrument(skip_all, fields(gym_id = %gym_id))]
    pub async fn sales_stats(
        &self,
        caller: &CallerIdentity,
        gym_id: Uuid,
    ) -> Result<SalesStatistics, ServiceError> {
        caller.require_gym(gym_id)?;
        let members = self.members.list(gym_id).await?;
        let entries = self.ledger.list(gym_id).await?;
        Ok(sales_statistics(&members, &entries, self.clock.today()))
    }

    #[instrument(skip_all, fields(gym_id = %gym_id, period = %period))]
    pub async fn chart(
        &self,
        caller: &CallerIdentity,
        gym_id: Uuid,
        period: ChartPeriod,
    ) -> Result<ChartSeries, ServiceError> {
        caller.require_gym(gym_id)?;
        let members = self.members.list(gym_id).await?;
        let entries = self.ledger.list(gym_id).await?;
        Ok(chart_series(period, &members, &entries, self.clock.today()))
    }
}

pub fn dashboard_snapshot(
    members: &[MemberModel],
    now: DateTime<Utc>,
    expiring_soon_days: i64,
) -> DashboardSnapshot {
    let today = now.date_naive();
    let soon_limit = today + Duration::days(expiring_soon_days);
    let same_month =
        |date: NaiveDate| date.year() == today.year() && date.month() == today.month();

    let active_members = members
        .iter()
        .filter(|member| member.status_at(now) == MemberStatus::Active)
        .count();

    let mut expiring_soon: Vec<ExpiringMember> = members
        .iter()
        .filter(|member| {
            let expiry = member.expires_at.date_naive();
            today <= expiry && expiry <= soon_limit
        })
        .map(|member| ExpiringMember {
            member_id: member.id,
            name: member.name.clone(),
            surname: member.surname.clone(),
            phone: member.phone.clone(),
            expires_at: member.expires_at,
            days_remaining: member.days_remaining(now),
        })
        .collect();
    expiring_soon.sort_by_key(|member| member.days_remaining);

    DashboardSnapshot {
        total_members: members.len(),
        active_members,
        expired_members: members.len() - active_members,
        new_today: members
            .iter()
            .filter(|member| member.created_at.date_naive() == today)
            .count(),
        new_this_month: members
            .iter()
            .filter(|member| same_month(member.created_at.date_naive()))
            .count(),
        expiring_soon,
        income_today: members
            .iter()
            .filter(|member| member.updated_at.date_naive() == today)
            .map(|member| member.last_price)
            .sum(),
        income_this_month: members
            .iter()
            .filter(|member| same_month(member.updated_at.date_naive()))
            .map(|member| member.last_price)
            .sum(),
    }
}

pub fn sales_statistics(
    members: &[MemberModel],
    entries: &[LedgerEntryModel],
    today: NaiveDate,
) -> SalesStatistics {
    SalesStatistics {
        day: sales_window(members, entries, today, today),
        month: sales_window(members, entries, periods::first_of_month(today), today),
        year: sales_window(members, entries, periods::first_of_year(today), today),
    }
}

pub fn sales_window(
    members: &[MemberModel],
    entries: &[LedgerEntryModel],
    from: NaiveDate,
    to: NaiveDate,
) -> SalesWindow {
    let in_window = |date: NaiveDate| from <= date && date <= to;

    let signup_revenue: Decimal = members
        .iter()
        .filter(|member| in_window(member.created_at.date_naive()))
        .map(|member| member.last_price)
        .sum();
    let ledger = ledger_totals(entries, from, to);
    let total_income = signup_revenue + ledger.income;

    SalesWindow {
        from,
        to,
        signup_revenue,
        ledger_income: ledger.income,
        total_income,
        total_expense: ledger.expense,
        net: total_income - ledger.expense,
    }
}

pub fn chart_series(
    period: ChartPeriod,
    members: &[MemberModel],
    entries: &[LedgerEntryModel],
    today: NaiveDate,
) -> ChartSeries {
    let buckets = periods::buckets(period, today);
    let mut labels = Vec::with_capacity(buckets.len());
    let mut income = Vec::with_capacity(buckets.len());
    let mut expense = Vec::with_capacity(buckets.len());

    for bucket in &buckets {
        let totals = window_totals(members, entries, bucket.start, bucket.end);
        labels.push(bucket.label.clone());
        income.push(totals.income);
        expense.push(totals.expense);
    }

    ChartSeries {
        period,
        from: buckets.first().map_or(today, |bucket| bucket.start),
        to: buckets.last().map_or(today, |bucket| bucket.end),
        labels,
        income,
        expense,
    }
}

/// Chart income and expense over `[from, to]`: member `last_price` by `updated_at` date
/// plus positive ledger amounts, against absolute negative ledger amounts.
pub fn window_totals(
    members: &[MemberModel],
    entries: &[LedgerEntryModel],
    from: NaiveDate,
    to: NaiveDate,
) -> Totals {
    let member_income: Decimal = members
        .iter()
        .filter(|member| {
            let touched = member.updated_at.date_naive();
            from <= touched && touched <= to
        })
        .map(|member| member.last_price)
        .sum();
    let ledger = ledger_totals(entries, from, to);

    Totals {
        income: member_income + ledger.income,
        expense: ledger.expense,
    }
}

fn ledger_totals(entries: &[LedgerEntryModel], from: NaiveDate, to: NaiveDate) -> Totals {
    entries
        .iter()
        .filter(|entry| {
            let date = entry.occurred_at.date_naive();
            from <= date && date <= to
        })
        .fold(Totals::default(), |mut totals, entry| {
            if entry.amount > Decimal::ZERO {
                totals.income += entry.amount;
            } else if entry.amount < Decimal::ZERO {
                totals.expense += entry.amount.abs();
            }
            totals
        })
}
