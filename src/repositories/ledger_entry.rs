//! # Ledger Repository
//!
//! SeaORM implementation of [`LedgerStore`].

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::{LedgerStore, entry_not_found};
use crate::error::RepositoryError;
use crate::models::ledger_entry::{ActiveModel, Column, Entity as LedgerEntry, Model};

/// Repository for ledger entry database operations
pub struct LedgerRepository {
    db: Arc<DatabaseConnection>,
}

impl LedgerRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LedgerStore for LedgerRepository {
    async fn list(&self, gym_id: Uuid) -> Result<Vec<Model>, RepositoryError> {
        LedgerEntry::find()
            .filter(Column::GymId.eq(gym_id))
            .order_by_desc(Column::OccurredAt)
            .all(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn get(&self, gym_id: Uuid, entry_id: Uuid) -> Result<Option<Model>, RepositoryError> {
        LedgerEntry::find_by_id(entry_id)
            .filter(Column::GymId.eq(gym_id))
            .one(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn append(&self, entry: Model) -> Result<Model, RepositoryError> {
        let entry = ActiveModel {
            id: Set(entry.id),
            gym_id: Set(entry.gym_id),
            message: Set(entry.message),
            amount: Set(entry.amount),
            kind: Set(entry.kind),
            member_id: Set(entry.member_id),
            member_name: Set(entry.member_name),
            occurred_at: Set(entry.occurred_at),
        };

        entry
            .insert(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn update(&self, entry: Model) -> Result<Model, RepositoryError> {
        let existing = self
            .get(entry.gym_id, entry.id)
            .await?
            .ok_or_else(|| entry_not_found(entry.id))?;

        let mut active: ActiveModel = existing.into();
        active.message = Set(entry.message);
        active.amount = Set(entry.amount);
        active.kind = Set(entry.kind);

        active
            .update(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn delete(&self, gym_id: Uuid, entry_id: Uuid) -> Result<(), RepositoryError> {
        let result = LedgerEntry::delete_many()
            .filter(Column::Id.eq(entry_id))
            .filter(Column::GymId.eq(gym_id))
            .exec(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected == 0 {
            return Err(entry_not_found(entry_id));
        }
        Ok(())
    }
}
