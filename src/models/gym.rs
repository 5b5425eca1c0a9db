//! # Gym Model
//!
//! Gyms are the tenants of the system. The paid/trial flag pair is only ever written
//! through a [`GymPlan`], which keeps exactly one of the two flags set.

use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gyms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name of the gym
    pub name: String,

    pub owner_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,

    /// Opaque reference to the gym's login credential, managed elsewhere
    pub credential_ref: Option<String>,

    /// Paid plan flag
    pub is_active: bool,

    /// Trial plan flag
    pub is_trial: bool,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::member::Entity")]
    Member,
    #[sea_orm(has_many = "super::ledger_entry::Entity")]
    LedgerEntry,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl Related<super::ledger_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// A gym on the trial plan with no contact details.
    pub fn new_trial(name: impl Into<String>, now: DateTimeUtc) -> Self {
        let (is_active, is_trial) = GymPlan::Trial.flags();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner_name: None,
            phone: None,
            email: None,
            credential_ref: None,
            is_active,
            is_trial,
            created_at: now,
            updated_at: now,
        }
    }

    /// Plan derived from the flag pair. A row with both flags cleared reads as trial.
    pub fn plan(&self) -> GymPlan {
        if self.is_active && !self.is_trial {
            GymPlan::Paid
        } else {
            GymPlan::Trial
        }
    }

    /// Writes both flags from `plan`.
    pub fn set_plan(&mut self, plan: GymPlan) {
        let (is_active, is_trial) = plan.flags();
        self.is_active = is_active;
        self.is_trial = is_trial;
    }
}

/// Subscription state of a gym.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GymPlan {
    Paid,
    Trial,
}

impl GymPlan {
    /// `(is_active, is_trial)`
    pub fn flags(self) -> (bool, bool) {
        match self {
            GymPlan::Paid => (true, false),
            GymPlan::Trial => (false, true),
        }
    }

    pub(crate) fn apply(self, active: &mut ActiveModel) {
        let (is_active, is_trial) = self.flags();
        active.is_active = Set(is_active);
        active.is_trial = Set(is_trial);
    }
}

/// Public representation of a gym
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GymResponse {
    pub id: Uuid,
    pub name: String,
    pub owner_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub plan: GymPlan,
    #[schema(value_type = String, example = "2025-01-01T12:00:00Z")]
    pub created_at: DateTimeUtc,
    #[schema(value_type = String, example = "2025-01-01T12:05:00Z")]
    pub updated_at: DateTimeUtc,
}

impl From<Model> for GymResponse {
    fn from(model: Model) -> Self {
        let plan = model.plan();
        Self {
            id: model.id,
            name: model.name,
            owner_name: model.owner_name,
            phone: model.phone,
            email: model.email,
            plan,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn gym(is_active: bool, is_trial: bool) -> Model {
        Model {
            id: Uuid::new_v4(),
            name: "Iron Temple".to_string(),
            owner_name: None,
            phone: None,
            email: None,
            credential_ref: None,
            is_active,
            is_trial,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn plan_flags_are_exclusive() {
        for plan in [GymPlan::Paid, GymPlan::Trial] {
            let (is_active, is_trial) = plan.flags();
            assert!(is_active ^ is_trial);
        }
    }

    #[test]
    fn set_plan_round_trips_through_flags() {
        let mut model = gym(false, true);
        assert_eq!(model.plan(), GymPlan::Trial);

        model.set_plan(GymPlan::Paid);
        assert!(model.is_active && !model.is_trial);
        assert_eq!(model.plan(), GymPlan::Paid);

        model.set_plan(GymPlan::Trial);
        assert!(!model.is_active && model.is_trial);
    }
}
