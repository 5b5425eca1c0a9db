//! # Gym Repository
//!
//! SeaORM implementation of [`GymStore`]. The plan flags are always written together.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use super::{GymStore, gym_not_found};
use crate::error::RepositoryError;
use crate::models::gym::{ActiveModel, Column, Entity as Gym, Model};

/// Repository for Gym database operations
pub struct GymRepository {
    db: Arc<DatabaseConnection>,
}

impl GymRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Validate gym name according to business rules
    fn validate_gym_name(name: &str) -> Result<(), RepositoryError> {
        if name.trim().is_empty() {
            return Err(RepositoryError::validation_error("Gym name cannot be empty"));
        }

        if name.chars().count() > 200 {
            return Err(RepositoryError::validation_error(
                "Gym name cannot exceed 200 characters",
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl GymStore for GymRepository {
    async fn get(&self, gym_id: Uuid) -> Result<Option<Model>, RepositoryError> {
        Gym::find_by_id(gym_id)
            .one(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn list(&self) -> Result<Vec<Model>, RepositoryError> {
        Gym::find()
            .order_by_asc(Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn insert(&self, gym: Model) -> Result<Model, RepositoryError> {
        Self::validate_gym_name(&gym.name)?;

        let mut active = ActiveModel {
            id: Set(gym.id),
            name: Set(gym.name.clone()),
            owner_name: Set(gym.owner_name.clone()),
            phone: Set(gym.phone.clone()),
            email: Set(gym.email.clone()),
            credential_ref: Set(gym.credential_ref.clone()),
            created_at: Set(gym.created_at),
            updated_at: Set(gym.updated_at),
            ..Default::default()
        };
        gym.plan().apply(&mut active);

        active
            .insert(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn update(&self, gym: Model) -> Result<Model, RepositoryError> {
        Self::validate_gym_name(&gym.name)?;

        let existing = self
            .get(gym.id)
            .await?
            .ok_or_else(|| gym_not_found(gym.id))?;

        let mut active: ActiveModel = existing.into();
        active.name = Set(gym.name.clone());
        active.owner_name = Set(gym.owner_name.clone());
        active.phone = Set(gym.phone.clone());
        active.email = Set(gym.email.clone());
        active.credential_ref = Set(gym.credential_ref.clone());
        active.updated_at = Set(gym.updated_at);
        gym.plan().apply(&mut active);

        active
            .update(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn delete(&self, gym_id: Uuid) -> Result<(), RepositoryError> {
        let result = Gym::delete_by_id(gym_id)
            .exec(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected == 0 {
            return Err(gym_not_found(gym_id));
        }
        Ok(())
    }
}
