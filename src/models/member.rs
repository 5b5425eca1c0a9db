//! # Member Model
//!
//! A member's access window ends at `expires_at`; status is derived from it on every
//! read and never stored.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::membership::status::{self, MemberStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning gym
    pub gym_id: Uuid,

    pub name: String,
    pub surname: String,
    pub email: Option<String>,

    /// Contact phone; empty for imported members without one
    pub phone: String,
    pub address: Option<String>,

    pub is_daily_pass: bool,

    /// Days bought by the last create, edit or renewal
    pub purchased_days: i32,

    /// Price paid at the last create, edit or renewal
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub last_price: Decimal,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,

    /// End of the paid access window
    pub expires_at: DateTimeUtc,
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

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> MemberStatus {
        status::member_status(self.expires_at, now)
    }

    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        status::days_remaining(self.expires_at, now)
    }
}

/// Member as returned to callers, with status evaluated at response time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberResponse {
    pub id: Uuid,
    pub gym_id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: Option<String>,
    pub is_daily_pass: bool,
    pub purchased_days: i32,
    #[schema(value_type = String, example = "25.00")]
    pub last_price: Decimal,
    #[schema(value_type = String, example = "2025-01-01T12:00:00Z")]
    pub created_at: DateTimeUtc,
    #[schema(value_type = String, example = "2025-01-01T12:00:00Z")]
    pub updated_at: DateTimeUtc,
    #[schema(value_type = String, example = "2025-01-31T12:00:00Z")]
    pub expires_at: DateTimeUtc,
    pub status: MemberStatus,
    /// Calendar days until expiry; negative once expired
    pub days_remaining: i64,
}

impl MemberResponse {
    pub fn at(model: Model, now: DateTime<Utc>) -> Self {
        let status = model.status_at(now);
        let days_remaining = model.days_remaining(now);
        Self {
            id: model.id,
            gym_id: model.gym_id,
            name: model.name,
            surname: model.surname,
            email: model.email,
            phone: model.phone,
            address: model.address,
            is_daily_pass: model.is_daily_pass,
            purchased_days: model.purchased_days,
            last_price: model.last_price,
            created_at: model.created_at,
            updated_at: model.updated_at,
            expires_at: model.expires_at,
            status,
            days_remaining,
        }
    }
}
