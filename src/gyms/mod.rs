//! # Gym Administration
//!
//! Tenant records. Administrators create, list, re-plan and delete gyms; a gym's own
//! staff may read and update its display details. New gyms start on the trial plan.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::clock::Clock;
use crate::error::ServiceError;
use crate::models::gym::{GymPlan, Model as GymModel};
use crate::repositories::{GymStore, MembershipStore};

/// Display and contact details of a gym.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GymDetails {
    pub name: String,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Input for registering a gym.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewGym {
    #[serde(flatten)]
    pub details: GymDetails,
    /// Opaque reference to the gym's login credential
    #[serde(default)]
    pub credential_ref: Option<String>,
}

#[derive(Clone)]
pub struct GymService {
    gyms: Arc<dyn GymStore>,
    members: Arc<dyn MembershipStore>,
    clock: Arc<dyn Clock>,
}

impl GymService {
    pub fn new(
        gyms: Arc<dyn GymStore>,
        members: Arc<dyn MembershipStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gyms,
            members,
            clock,
        }
    }

    #[instrument(skip_all)]
    pub async fn create(
        &self,
        caller: &CallerIdentity,
        new_gym: NewGym,
    ) -> Result<GymModel, ServiceError> {
        caller.require_admin()?;
        let details = validate_details(new_gym.details)?;
        let gym = GymModel {
            owner_name: details.owner_name,
            phone: details.phone,
            email: details.email,
            credential_ref: new_gym.credential_ref,
            ..GymModel::new_trial(details.name, self.clock.now())
        };

        let gym = self.gyms.insert(gym).await?;
        info!(gym_id = %gym.id, "Created gym");
        Ok(gym)
    }

    pub async fn list(&self, caller: &CallerIdentity) -> Result<Vec<GymModel>, ServiceError> {
        caller.require_admin()?;
        Ok(self.gyms.list().await?)
    }

    pub async fn get(&self, caller: &CallerIdentity, gym_id: Uuid) -> Result<GymModel, ServiceError> {
        caller.require_gym_or_admin(gym_id)?;
        self.find(gym_id).await
    }

    #[instrument(skip_all, fields(gym_id = %gym_id))]
    pub async fn update(
        &self,
        caller: &CallerIdentity,
        gym_id: Uuid,
        details: GymDetails,
    ) -> Result<GymModel, ServiceError> {
        caller.require_gym_or_admin(gym_id)?;
        let details = validate_details(details)?;
        let current = self.find(gym_id).await?;

        let updated = GymModel {
            name: details.name,
            owner_name: details.owner_name,
            phone: details.phone,
            email: details.email,
            updated_at: self.clock.now(),
            ..current
        };

        let gym = self.gyms.update(updated).await?;
        info!("Updated gym details");
        Ok(gym)
    }

    /// Switches a gym between the paid and trial plans.
    #[instrument(skip_all, fields(gym_id = %gym_id, plan = ?plan))]
    pub async fn set_plan(
        &self,
        caller: &CallerIdentity,
        gym_id: Uuid,
        plan: GymPlan,
    ) -> Result<GymModel, ServiceError> {
        caller.require_admin()?;
        let mut gym = self.find(gym_id).await?;
        gym.set_plan(plan);
        gym.updated_at = self.clock.now();

        let gym = self.gyms.update(gym).await?;
        info!("Changed gym plan");
        Ok(gym)
    }

    /// Deletes a gym that has no members left.
    #[instrument(skip_all, fields(gym_id = %gym_id))]
    pub async fn delete(&self, caller: &CallerIdentity, gym_id: Uuid) -> Result<(), ServiceError> {
        caller.require_admin()?;
        self.find(gym_id).await?;

        if self.members.exists_any(gym_id).await? {
            return Err(ServiceError::validation(
                "Gym still has members; remove them before deleting the gym",
            ));
        }

        self.gyms.delete(gym_id).await?;
        info!("Deleted gym");
        Ok(())
    }

    async fn find(&self, gym_id: Uuid) -> Result<GymModel, ServiceError> {
        fetch_gym(self.gyms.as_ref(), gym_id).await
    }
}

/// Loads a gym, mapping an unknown id to [`ServiceError::NotFound`].
pub(crate) async fn fetch_gym(gyms: &dyn GymStore, gym_id: Uuid) -> Result<GymModel, ServiceError> {
    gyms.get(gym_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("Gym {gym_id} not found")))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn validate_details(details: GymDetails) -> Result<GymDetails, ServiceError> {
    let name = details.name.trim().to_string();
    if name.is_empty() {
        return Err(ServiceError::validation("Gym name cannot be empty"));
    }
    if name.chars().count() > 200 {
        return Err(ServiceError::validation(
            "Gym name cannot exceed 200 characters",
        ));
    }

    Ok(GymDetails {
        name,
        owner_name: optional(details.owner_name),
        phone: optional(details.phone),
        email: optional(details.email),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::ledger::LedgerRecorder;
    use crate::membership::{MemberDraft, MembershipManager};
    use crate::repositories::InMemoryStore;
    use rust_decimal_macros::dec;

    struct Fixture {
        service: GymService,
        manager: MembershipManager,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(FixedClock::at_date(2025, 1, 1));
        let store = Arc::new(InMemoryStore::new());
        let recorder = LedgerRecorder::new(store.clone(), store.clone(), clock.clone());
        Fixture {
            service: GymService::new(store.clone(), store.clone(), clock.clone()),
            manager: MembershipManager::new(store.clone(), store, recorder, clock),
        }
    }

    fn new_gym(name: &str) -> NewGym {
        NewGym {
            details: GymDetails {
                name: name.to_string(),
                owner_name: Some("Sam".to_string()),
                phone: None,
                email: None,
            },
            credential_ref: None,
        }
    }

    fn assert_plan_invariant(gym: &GymModel) {
        assert!(gym.is_active ^ gym.is_trial);
    }

    #[tokio::test]
    async fn new_gyms_start_on_trial_and_plans_stay_exclusive() {
        let f = fixture();
        let admin = CallerIdentity::Admin;

        let gym = f.service.create(&admin, new_gym("Iron Temple")).await.unwrap();
        assert_eq!(gym.plan(), GymPlan::Trial);
        assert_plan_invariant(&gym);

        let paid = f.service.set_plan(&admin, gym.id, GymPlan::Paid).await.unwrap();
        assert_eq!(paid.plan(), GymPlan::Paid);
        assert_plan_invariant(&paid);

        let back = f.service.set_plan(&admin, gym.id, GymPlan::Trial).await.unwrap();
        assert_plan_invariant(&back);
        assert_eq!(back.plan(), GymPlan::Trial);
    }

    #[tokio::test]
    async fn deleting_a_gym_with_members_is_refused() {
        let f = fixture();
        let admin = CallerIdentity::Admin;
        let gym = f.service.create(&admin, new_gym("Iron Temple")).await.unwrap();
        let staff = CallerIdentity::Tenant(gym.id);

        let member = f
            .manager
            .create(
                &staff,
                gym.id,
                MemberDraft {
                    name: "Ana".to_string(),
                    surname: "Lopez".to_string(),
                    email: None,
                    phone: "555".to_string(),
                    address: None,
                    is_daily_pass: false,
                    purchased_days: 30,
                    last_price: dec!(20),
                },
            )
            .await
            .unwrap();

        let refused = f.service.delete(&admin, gym.id).await;
        assert!(matches!(refused, Err(ServiceError::Validation(_))));

        f.manager.delete(&staff, gym.id, member.id).await.unwrap();
        f.service.delete(&admin, gym.id).await.unwrap();
        assert!(matches!(
            f.service.get(&admin, gym.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn staff_may_update_their_own_gym_only() {
        let f = fixture();
        let admin = CallerIdentity::Admin;
        let gym = f.service.create(&admin, new_gym("Iron Temple")).await.unwrap();
        let other = f.service.create(&admin, new_gym("Zen Yoga")).await.unwrap();
        let staff = CallerIdentity::Tenant(gym.id);

        let updated = f
            .service
            .update(
                &staff,
                gym.id,
                GymDetails {
                    name: "Iron Temple Downtown".to_string(),
                    owner_name: None,
                    phone: Some(" 555-0101 ".to_string()),
                    email: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Iron Temple Downtown");
        assert_eq!(updated.phone.as_deref(), Some("555-0101"));
        assert_eq!(updated.plan(), GymPlan::Trial);

        assert!(matches!(
            f.service.get(&staff, other.id).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.set_plan(&staff, gym.id, GymPlan::Paid).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.list(&staff).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.list(&CallerIdentity::Anonymous).await,
            Err(ServiceError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn blank_names_are_rejected() {
        let f = fixture();
        let result = f.service.create(&CallerIdentity::Admin, new_gym("  ")).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }
}
