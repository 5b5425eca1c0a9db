//! # Ledger Entry Model
//!
//! Signed financial and audit records of a gym. Positive amounts are income, negative
//! amounts are expenses.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, DeriveEntityModel, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub gym_id: Uuid,

    pub message: String,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,

    pub kind: LedgerKind,

    /// Member the entry is about; kept after the member is deleted
    pub member_id: Option<Uuid>,

    /// Member's full name at the time of the event
    pub member_name: Option<String>,

    pub occurred_at: DateTimeUtc,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    #[sea_orm(string_value = "income")]
    Income,
    #[sea_orm(string_value = "expense")]
    Expense,
    #[sea_orm(string_value = "member_created")]
    MemberCreated,
    #[sea_orm(string_value = "member_edited")]
    MemberEdited,
    #[sea_orm(string_value = "member_renewed")]
    MemberRenewed,
    #[sea_orm(string_value = "member_deleted")]
    MemberDeleted,
}

impl LedgerKind {
    /// Manual kinds are the only ones whose message and amount may be edited.
    pub fn is_manual(self) -> bool {
        matches!(self, LedgerKind::Income | LedgerKind::Expense)
    }

    /// Kind of a manual entry with the given amount; zero counts as income.
    pub fn classify(amount: Decimal) -> Self {
        if amount < Decimal::ZERO {
            LedgerKind::Expense
        } else {
            LedgerKind::Income
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::gym::Entity",
        from = "Column::GymId",
        to = "super::gym::Column::Id"
    )]
    Gym,
}

impl Related<super::gym::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Gym.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Public representation of a ledger entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LedgerEntryResponse {
    pub id: Uuid,
    pub gym_id: Uuid,
    pub message: String,
    #[schema(value_type = String, example = "-50.00")]
    pub amount: Decimal,
    pub kind: LedgerKind,
    pub member_id: Option<Uuid>,
    pub member_name: Option<String>,
    #[schema(value_type = String, example = "2025-01-01T12:00:00Z")]
    pub occurred_at: DateTimeUtc,
}

impl From<Model> for LedgerEntryResponse {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            gym_id: model.gym_id,
            message: model.message,
            amount: model.amount,
            kind: model.kind,
            member_id: model.member_id,
            member_name: model.member_name,
            occurred_at: model.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn classify_by_sign() {
        assert_eq!(LedgerKind::classify(dec!(-50.00)), LedgerKind::Expense);
        assert_eq!(LedgerKind::classify(dec!(20.00)), LedgerKind::Income);
        assert_eq!(LedgerKind::classify(dec!(0)), LedgerKind::Income);
        assert_eq!(LedgerKind::classify(dec!(-0.00)), LedgerKind::Income);
    }

    #[test]
    fn only_income_and_expense_are_manual() {
        assert!(LedgerKind::Income.is_manual());
        assert!(LedgerKind::Expense.is_manual());
        assert!(!LedgerKind::MemberCreated.is_manual());
        assert!(!LedgerKind::MemberRenewed.is_manual());
    }
}
