//! # Repository Layer
//!
//! Store traits consumed by the services, with SeaORM-backed implementations and an
//! in-memory implementation for tests and embedding. Every member and ledger query is
//! scoped by gym id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::gym::Model as GymModel;
use crate::models::ledger_entry::Model as LedgerEntryModel;
use crate::models::member::Model as MemberModel;

pub mod gym;
pub mod ledger_entry;
pub mod member;
pub mod memory;

pub use gym::GymRepository;
pub use ledger_entry::LedgerRepository;
pub use member::MemberRepository;
pub use memory::InMemoryStore;

/// Member records keyed by (gym, member id).
#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn get(
        &self,
        gym_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<MemberModel>, RepositoryError>;

    /// Members of a gym ordered by surname, then name.
    async fn list(&self, gym_id: Uuid) -> Result<Vec<MemberModel>, RepositoryError>;

    /// Inserts when `expected_updated_at` is `None`. Otherwise updates the stored row only
    /// if its `updated_at` still equals the expected value, returning
    /// [`RepositoryError::Conflict`] when it does not.
    async fn upsert(
        &self,
        member: MemberModel,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<MemberModel, RepositoryError>;

    async fn delete(&self, gym_id: Uuid, member_id: Uuid) -> Result<(), RepositoryError>;

    async fn exists_any(&self, gym_id: Uuid) -> Result<bool, RepositoryError>;
}

/// Ledger entries keyed by (gym, entry id).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Entries of a gym, newest first.
    async fn list(&self, gym_id: Uuid) -> Result<Vec<LedgerEntryModel>, RepositoryError>;

    async fn get(
        &self,
        gym_id: Uuid,
        entry_id: Uuid,
    ) -> Result<Option<LedgerEntryModel>, RepositoryError>;

    async fn append(
        &self,
        entry: LedgerEntryModel,
    ) -> Result<LedgerEntryModel, RepositoryError>;

    async fn update(
        &self,
        entry: LedgerEntryModel,
    ) -> Result<LedgerEntryModel, RepositoryError>;

    async fn delete(&self, gym_id: Uuid, entry_id: Uuid) -> Result<(), RepositoryError>;
}

/// Gym (tenant) records.
#[async_trait]
pub trait GymStore: Send + Sync {
    async fn get(&self, gym_id: Uuid) -> Result<Option<GymModel>, RepositoryError>;

    /// All gyms, oldest first.
    async fn list(&self) -> Result<Vec<GymModel>, RepositoryError>;

    async fn insert(&self, gym: GymModel) -> Result<GymModel, RepositoryError>;

    async fn update(&self, gym: GymModel) -> Result<GymModel, RepositoryError>;

    async fn delete(&self, gym_id: Uuid) -> Result<(), RepositoryError>;
}

pub(crate) fn member_not_found(member_id: Uuid) -> RepositoryError {
    RepositoryError::NotFound(format!("Member {member_id} not found"))
}

pub(crate) fn entry_not_found(entry_id: Uuid) -> RepositoryError {
    RepositoryError::NotFound(format!("Ledger entry {entry_id} not found"))
}

pub(crate) fn gym_not_found(gym_id: Uuid) -> RepositoryError {
    RepositoryError::NotFound(format!("Gym {gym_id} not found"))
}
