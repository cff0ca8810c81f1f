use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, delete, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        errors::map_constraint_violation, postgres_connection::PgPoolSquad, schema::app_users,
    },
};
use domain::{
    entities::app_users::{AppUserEntity, InsertAppUserEntity, UpdateAppUserEntity},
    repositories::app_users::AppUserRepository,
};

pub struct AppUserPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AppUserPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AppUserRepository for AppUserPostgres {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<AppUserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let user = app_users::table
            .find(user_id)
            .select(AppUserEntity::as_select())
            .first::<AppUserEntity>(&mut conn)
            .optional()?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AppUserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let user = app_users::table
            .filter(app_users::email.eq(email))
            .select(AppUserEntity::as_select())
            .first::<AppUserEntity>(&mut conn)
            .optional()?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<AppUserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = app_users::table
            .order(app_users::created_at.desc())
            .select(AppUserEntity::as_select())
            .load::<AppUserEntity>(&mut conn)?;

        Ok(results)
    }

    async fn create_user(&self, user: InsertAppUserEntity) -> Result<AppUserEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = insert_into(app_users::table)
            .values(&user)
            .returning(AppUserEntity::as_returning())
            .get_result::<AppUserEntity>(&mut conn)
            .map_err(map_constraint_violation)?;

        Ok(created)
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        changes: UpdateAppUserEntity,
    ) -> Result<Option<AppUserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(app_users::table.find(user_id))
            .set(&changes)
            .returning(AppUserEntity::as_returning())
            .get_result::<AppUserEntity>(&mut conn)
            .optional()
            .map_err(map_constraint_violation)?;

        Ok(updated)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = delete(app_users::table.find(user_id)).execute(&mut conn)?;

        Ok(deleted > 0)
    }
}
