//! # Member Repository
//!
//! SeaORM implementation of [`MembershipStore`]. Updates carry an optimistic check on
//! `updated_at` so that a write based on a stale read is rejected.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::{MembershipStore, member_not_found};
use crate::error::RepositoryError;
use crate::models::member::{ActiveModel, Column, Entity as Member, Model};

/// Repository for Member database operations
pub struct MemberRepository {
    db: Arc<DatabaseConnection>,
}

impl MemberRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn active_model(member: &Model) -> ActiveModel {
        ActiveModel {
            id: Set(member.id),
            gym_id: Set(member.gym_id),
            name: Set(member.name.clone()),
            surname: Set(member.surname.clone()),
            email: Set(member.email.clone()),
            phone: Set(member.phone.clone()),
            address: Set(member.address.clone()),
            is_daily_pass: Set(member.is_daily_pass),
            purchased_days: Set(member.purchased_days),
            last_price: Set(member.last_price),
            created_at: Set(member.created_at),
            updated_at: Set(member.updated_at),
            expires_at: Set(member.expires_at),
        }
    }
}

#[async_trait]
impl MembershipStore for MemberRepository {
    async fn get(&self, gym_id: Uuid, member_id: Uuid) -> Result<Option<Model>, RepositoryError> {
        Member::find_by_id(member_id)
            .filter(Column::GymId.eq(gym_id))
            .one(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn list(&self, gym_id: Uuid) -> Result<Vec<Model>, RepositoryError> {
        Member::find()
            .filter(Column::GymId.eq(gym_id))
            .order_by_asc(Column::Surname)
            .order_by_asc(Column::Name)
            .order_by_asc(Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn upsert(
        &self,
        member: Model,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<Model, RepositoryError> {
        let Some(expected) = expected_updated_at else {
            return Self::active_model(&member)
                .insert(self.db.as_ref())
                .await
                .map_err(RepositoryError::database_error);
        };

        let mut changes = Self::active_model(&member);
        changes.id = sea_orm::ActiveValue::NotSet;
        changes.gym_id = sea_orm::ActiveValue::NotSet;
        changes.created_at = sea_orm::ActiveValue::NotSet;

        let result = Member::update_many()
            .set(changes)
            .filter(Column::Id.eq(member.id))
            .filter(Column::GymId.eq(member.gym_id))
            .filter(Column::UpdatedAt.eq(expected))
            .exec(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected == 0 {
            return match self.get(member.gym_id, member.id).await? {
                Some(_) => Err(RepositoryError::conflict(format!(
                    "Member {} was modified concurrently",
                    member.id
                ))),
                None => Err(member_not_found(member.id)),
            };
        }

        self.get(member.gym_id, member.id)
            .await?
            .ok_or_else(|| member_not_found(member.id))
    }

    async fn delete(&self, gym_id: Uuid, member_id: Uuid) -> Result<(), RepositoryError> {
        let result = Member::delete_many()
            .filter(Column::Id.eq(member_id))
            .filter(Column::GymId.eq(gym_id))
            .exec(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected == 0 {
            return Err(member_not_found(member_id));
        }
        Ok(())
    }

    async fn exists_any(&self, gym_id: Uuid) -> Result<bool, RepositoryError> {
        let count = Member::find()
            .filter(Column::GymId.eq(gym_id))
            .count(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(count > 0)
    }
}
