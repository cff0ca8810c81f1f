use std::sync::Arc;

use anyhow::anyhow;
use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use crates::domain::{
    entities::app_users::{InsertAppUserEntity, UpdateAppUserEntity},
    repositories::app_users::AppUserRepository,
    value_objects::{
        app_users::{RegisterUserRequest, UpdateUserRequest, UserDto},
        enums::user_roles::UserRole,
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::{UseCaseError, UseCaseResult, conflict_or_internal};
use crate::auth::AuthUser;

pub struct UserUseCase<U>
where
    U: AppUserRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
}

impl<U> UserUseCase<U>
where
    U: AppUserRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn create_user(&self, request: RegisterUserRequest) -> UseCaseResult<UserDto> {
        request.validate()?;
        let (Some(username), Some(email), Some(password)) =
            (request.username, request.email, request.password)
        else {
            return Err(UseCaseError::Validation(
                "username, email and password are required".to_string(),
            ));
        };

        let existing = self.user_repo.find_by_email(&email).await.map_err(|err| {
            error!(db_error = ?err, "users: failed to look up email");
            UseCaseError::Internal(err)
        })?;
        if existing.is_some() {
            return Err(UseCaseError::Conflict(format!(
                "a user with email {email} already exists"
            )));
        }

        let password_hash = hash_password(&password)?;
        let role = request.role.unwrap_or_default();

        let created = self
            .user_repo
            .create_user(InsertAppUserEntity {
                username,
                email,
                password_hash,
                address: request.address,
                phone: request.phone,
                role: role.to_string(),
            })
            .await
            .map_err(|err| {
                error!(db_error = ?err, "users: failed to insert user");
                conflict_or_internal(err, || "a user with this email already exists".to_string())
            })?;

        info!(user_id = %created.id, %role, "users: user created");

        Ok(UserDto::from(created))
    }

    pub async fn list_users(&self) -> UseCaseResult<Vec<UserDto>> {
        let users = self.user_repo.list_users().await.map_err(|err| {
            error!(db_error = ?err, "users: failed to list users");
            UseCaseError::Internal(err)
        })?;

        Ok(users.into_iter().map(UserDto::from).collect())
    }

    pub async fn me(&self, user_id: Uuid) -> UseCaseResult<UserDto> {
        self.user_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "users: failed to load user");
                UseCaseError::Internal(err)
            })?
            .map(UserDto::from)
            .ok_or_else(|| UseCaseError::NotFound(format!("user {user_id} not found")))
    }

    pub async fn get_user(&self, user_id: Uuid, actor: &AuthUser) -> UseCaseResult<UserDto> {
        ensure_owner_or_admin(user_id, actor)?;
        self.me(user_id).await
    }

    /// Members may edit their own profile but not their role.
    pub async fn update_user(
        &self,
        user_id: Uuid,
        request: UpdateUserRequest,
        actor: &AuthUser,
    ) -> UseCaseResult<UserDto> {
        ensure_owner_or_admin(user_id, actor)?;
        request.validate()?;

        if request.role.is_some() && !actor.is_admin() {
            warn!(%user_id, actor_id = %actor.user_id, "users: role change refused");
            return Err(UseCaseError::Forbidden(
                "only an admin can change a role".to_string(),
            ));
        }

        let password_hash = request.password.as_deref().map(hash_password).transpose()?;

        let changes = UpdateAppUserEntity {
            username: request.username,
            email: request.email,
            password_hash,
            address: request.address,
            phone: request.phone,
            role: request.role.map(|role| role.to_string()),
            updated_at: Utc::now(),
        };

        let updated = self
            .user_repo
            .update_user(user_id, changes)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "users: failed to update user");
                conflict_or_internal(err, || "a user with this email already exists".to_string())
            })?
            .ok_or_else(|| UseCaseError::NotFound(format!("user {user_id} not found")))?;

        info!(%user_id, actor_id = %actor.user_id, "users: user updated");
        Ok(UserDto::from(updated))
    }

    /// Removes the user along with their subscriptions and payments.
    pub async fn delete_user(&self, user_id: Uuid) -> UseCaseResult<()> {
        let deleted = self.user_repo.delete_user(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "users: failed to delete user");
            UseCaseError::Internal(err)
        })?;

        if !deleted {
            return Err(UseCaseError::NotFound(format!("user {user_id} not found")));
        }

        info!(%user_id, "users: user deleted");
        Ok(())
    }
}

fn ensure_owner_or_admin(user_id: Uuid, actor: &AuthUser) -> UseCaseResult<()> {
    if actor.user_id == user_id || actor.is_admin() {
        return Ok(());
    }

    Err(UseCaseError::Forbidden(format!(
        "user {user_id} belongs to someone else"
    )))
}

fn hash_password(password: &str) -> UseCaseResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| UseCaseError::Internal(anyhow!("failed to hash password: {err}")))
}
