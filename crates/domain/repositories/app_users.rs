use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::app_users::{AppUserEntity, InsertAppUserEntity, UpdateAppUserEntity};

#[automock]
#[async_trait]
pub trait AppUserRepository {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<AppUserEntity>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<AppUserEntity>>;
    async fn list_users(&self) -> Result<Vec<AppUserEntity>>;
    /// A taken email fails with [`super::ConstraintViolation`].
    async fn create_user(&self, user: InsertAppUserEntity) -> Result<AppUserEntity>;
    async fn update_user(
        &self,
        user_id: Uuid,
        changes: UpdateAppUserEntity,
    ) -> Result<Option<AppUserEntity>>;
    /// Subscriptions and their payments go with the user. Returns `false` when no user had this id.
    async fn delete_user(&self, user_id: Uuid) -> Result<bool>;
}
