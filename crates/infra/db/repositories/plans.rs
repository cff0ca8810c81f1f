use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, delete, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{
    errors::map_constraint_violation,
    postgres_connection::PgPoolSquad,
    schema::{plans, subscriptions},
};
use domain::{
    entities::plans::{InsertPlanEntity, PlanEntity, UpdatePlanEntity},
    repositories::plans::PlanRepository,
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};

pub struct PlanPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PlanPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PlanRepository for PlanPostgres {
    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let plan = plans::table
            .find(plan_id)
            .select(PlanEntity::as_select())
            .first::<PlanEntity>(&mut conn)
            .optional()?;

        Ok(plan)
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = plans::table
            .filter(plans::name.eq(name))
            .order(plans::created_at.asc())
            .select(PlanEntity::as_select())
            .load::<PlanEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_plans(&self) -> Result<Vec<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = plans::table
            .order(plans::price_minor.asc())
            .select(PlanEntity::as_select())
            .load::<PlanEntity>(&mut conn)?;

        Ok(results)
    }

    async fn create_plan(&self, plan: InsertPlanEntity) -> Result<PlanEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = insert_into(plans::table)
            .values(&plan)
            .returning(PlanEntity::as_returning())
            .get_result::<PlanEntity>(&mut conn)?;

        Ok(created)
    }

    async fn update_plan(
        &self,
        plan_id: Uuid,
        changes: UpdatePlanEntity,
    ) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(plans::table.find(plan_id))
            .set(&changes)
            .returning(PlanEntity::as_returning())
            .get_result::<PlanEntity>(&mut conn)
            .optional()?;

        Ok(updated)
    }

    async fn delete_plan(&self, plan_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = delete(plans::table.find(plan_id))
            .execute(&mut conn)
            .map_err(map_constraint_violation)?;

        Ok(deleted > 0)
    }

    async fn count_subscriptions(&self, plan_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = subscriptions::table
            .filter(subscriptions::plan_id.eq(plan_id))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn count_active_subscriptions(&self, plan_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = subscriptions::table
            .filter(subscriptions::plan_id.eq(plan_id))
            .filter(subscriptions::status.eq(SubscriptionStatus::Active.to_string()))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }
}
