//! In-memory store implementing all three store traits.
//!
//! Used by unit tests and when embedding the engines without a database. Honors the
//! same ordering, scoping and optimistic-update rules as the SeaORM repositories.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    GymStore, LedgerStore, MembershipStore, entry_not_found, gym_not_found, member_not_found,
};
use crate::error::RepositoryError;
use crate::models::gym::Model as GymModel;
use crate::models::ledger_entry::Model as LedgerEntryModel;
use crate::models::member::Model as MemberModel;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    gyms: RwLock<HashMap<Uuid, GymModel>>,
    members: RwLock<HashMap<Uuid, MemberModel>>,
    // Insertion order breaks timestamp ties when listing
    ledger: RwLock<Vec<LedgerEntryModel>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `gyms`.
    pub fn with_gyms(gyms: impl IntoIterator<Item = GymModel>) -> Self {
        Self {
            gyms: RwLock::new(gyms.into_iter().map(|gym| (gym.id, gym)).collect()),
            ..Self::default()
        }
    }
}

fn sort_members(members: &mut [MemberModel]) {
    members.sort_by(|a, b| {
        a.surname
            .cmp(&b.surname)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
}

#[async_trait]
impl MembershipStore for InMemoryStore {
    async fn get(
        &self,
        gym_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<MemberModel>, RepositoryError> {
        let members = self.members.read().await;
        Ok(members
            .get(&member_id)
            .filter(|member| member.gym_id == gym_id)
            .cloned())
    }

    async fn list(&self, gym_id: Uuid) -> Result<Vec<MemberModel>, RepositoryError> {
        let members = self.members.read().await;
        let mut scoped: Vec<MemberModel> = members
            .values()
            .filter(|member| member.gym_id == gym_id)
            .cloned()
            .collect();
        sort_members(&mut scoped);
        Ok(scoped)
    }

    async fn upsert(
        &self,
        member: MemberModel,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<MemberModel, RepositoryError> {
        let mut members = self.members.write().await;

        match expected_updated_at {
            None => {
                if members.contains_key(&member.id) {
                    return Err(RepositoryError::conflict(format!(
                        "Member {} already exists",
                        member.id
                    )));
                }
                members.insert(member.id, member.clone());
                Ok(member)
            }
            Some(expected) => {
                let stored = members
                    .get_mut(&member.id)
                    .filter(|stored| stored.gym_id == member.gym_id)
                    .ok_or_else(|| member_not_found(member.id))?;

                if stored.updated_at != expected {
                    return Err(RepositoryError::conflict(format!(
                        "Member {} was modified concurrently",
                        member.id
                    )));
                }

                let created_at = stored.created_at;
                *stored = MemberModel {
                    created_at,
                    ..member
                };
                Ok(stored.clone())
            }
        }
    }

    async fn delete(&self, gym_id: Uuid, member_id: Uuid) -> Result<(), RepositoryError> {
        let mut members = self.members.write().await;
        match members.get(&member_id) {
            Some(member) if member.gym_id == gym_id => {
                members.remove(&member_id);
                Ok(())
            }
            _ => Err(member_not_found(member_id)),
        }
    }

    async fn exists_any(&self, gym_id: Uuid) -> Result<bool, RepositoryError> {
        let members = self.members.read().await;
        Ok(members.values().any(|member| member.gym_id == gym_id))
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn list(&self, gym_id: Uuid) -> Result<Vec<LedgerEntryModel>, RepositoryError> {
        let ledger = self.ledger.read().await;
        let mut scoped: Vec<LedgerEntryModel> = ledger
            .iter()
            .rev()
            .filter(|entry| entry.gym_id == gym_id)
            .cloned()
            .collect();
        // Stable: equal timestamps keep newest-inserted first
        scoped.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(scoped)
    }

    async fn get(
        &self,
        gym_id: Uuid,
        entry_id: Uuid,
    ) -> Result<Option<LedgerEntryModel>, RepositoryError> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .iter()
            .find(|entry| entry.id == entry_id && entry.gym_id == gym_id)
            .cloned())
    }

    async fn append(&self, entry: LedgerEntryModel) -> Result<LedgerEntryModel, RepositoryError> {
        let mut ledger = self.ledger.write().await;
        if ledger.iter().any(|existing| existing.id == entry.id) {
            return Err(RepositoryError::conflict(format!(
                "Ledger entry {} already exists",
                entry.id
            )));
        }
        ledger.push(entry.clone());
        Ok(entry)
    }

    async fn update(&self, entry: LedgerEntryModel) -> Result<LedgerEntryModel, RepositoryError> {
        let mut ledger = self.ledger.write().await;
        let stored = ledger
            .iter_mut()
            .find(|existing| existing.id == entry.id && existing.gym_id == entry.gym_id)
            .ok_or_else(|| entry_not_found(entry.id))?;

        stored.message = entry.message;
        stored.amount = entry.amount;
        stored.kind = entry.kind;
        Ok(stored.clone())
    }

    async fn delete(&self, gym_id: Uuid, entry_id: Uuid) -> Result<(), RepositoryError> {
        let mut ledger = self.ledger.write().await;
        let before = ledger.len();
        ledger.retain(|entry| !(entry.id == entry_id && entry.gym_id == gym_id));
        if ledger.len() == before {
            return Err(entry_not_found(entry_id));
        }
        Ok(())
    }
}

#[async_trait]
impl GymStore for InMemoryStore {
    async fn get(&self, gym_id: Uuid) -> Result<Option<GymModel>, RepositoryError> {
        Ok(self.gyms.read().await.get(&gym_id).cloned())
    }

    async fn list(&self) -> Result<Vec<GymModel>, RepositoryError> {
        let mut gyms: Vec<GymModel> = self.gyms.read().await.values().cloned().collect();
        gyms.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(gyms)
    }

    async fn insert(&self, gym: GymModel) -> Result<GymModel, RepositoryError> {
        let mut gyms = self.gyms.write().await;
        if gyms.contains_key(&gym.id) {
            return Err(RepositoryError::conflict(format!(
                "Gym {} already exists",
                gym.id
            )));
        }
        gyms.insert(gym.id, gym.clone());
        Ok(gym)
    }

    async fn update(&self, gym: GymModel) -> Result<GymModel, RepositoryError> {
        let mut gyms = self.gyms.write().await;
        let stored = gyms.get_mut(&gym.id).ok_or_else(|| gym_not_found(gym.id))?;
        *stored = gym;
        Ok(stored.clone())
    }

    async fn delete(&self, gym_id: Uuid) -> Result<(), RepositoryError> {
        self.gyms
            .write()
            .await
            .remove(&gym_id)
            .map(|_| ())
            .ok_or_else(|| gym_not_found(gym_id))
    }
}
