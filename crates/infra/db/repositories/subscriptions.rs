use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{PgConnection, RunQueryDsl, delete, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{app_users, plans, subscriptions},
    },
};
use domain::{
    entities::{
        plans::PlanEntity,
        subscriptions::{
            InsertSubscriptionEntity, ReminderCandidateEntity, SubscriptionEntity,
            UpdateSubscriptionEntity,
        },
    },
    repositories::subscriptions::SubscriptionRepository,
    value_objects::{
        enums::subscription_statuses::SubscriptionStatus,
        subscription_lifecycle::SubscriptionPeriodUpdate,
    },
};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

/// Compare-and-set of the lifecycle columns. Shared with the payment transaction.
pub(crate) fn apply_period_update_on(
    conn: &mut PgConnection,
    period: &SubscriptionPeriodUpdate,
) -> QueryResult<Option<SubscriptionEntity>> {
    update(
        subscriptions::table
            .filter(subscriptions::id.eq(period.subscription_id))
            .filter(subscriptions::version.eq(period.expected_version)),
    )
    .set((
        subscriptions::status.eq(period.status.to_string()),
        subscriptions::starts_at.eq(period.starts_at),
        subscriptions::ends_at.eq(period.ends_at),
        subscriptions::version.eq(subscriptions::version + 1),
        subscriptions::updated_at.eq(Utc::now()),
    ))
    .returning(SubscriptionEntity::as_returning())
    .get_result::<SubscriptionEntity>(conn)
    .optional()
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let subscription = subscriptions::table
            .find(subscription_id)
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(subscription)
    }

    async fn list_subscriptions(&self) -> Result<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = subscriptions::table
            .order(subscriptions::created_at.desc())
            .select(SubscriptionEntity::as_select())
            .load::<SubscriptionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_by_user_with_plan(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(SubscriptionEntity, PlanEntity)>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = subscriptions::table
            .inner_join(plans::table)
            .filter(subscriptions::user_id.eq(user_id))
            .order(subscriptions::starts_at.desc())
            .select((SubscriptionEntity::as_select(), PlanEntity::as_select()))
            .load::<(SubscriptionEntity, PlanEntity)>(&mut conn)?;

        Ok(results)
    }

    async fn create_subscription(
        &self,
        subscription: InsertSubscriptionEntity,
    ) -> Result<SubscriptionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = insert_into(subscriptions::table)
            .values(&subscription)
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)?;

        Ok(created)
    }

    async fn update_if_version(
        &self,
        subscription_id: Uuid,
        expected_version: i32,
        changes: UpdateSubscriptionEntity,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(
            subscriptions::table
                .filter(subscriptions::id.eq(subscription_id))
                .filter(subscriptions::version.eq(expected_version)),
        )
        .set((
            subscriptions::user_id.eq(changes.user_id),
            subscriptions::plan_id.eq(changes.plan_id),
            subscriptions::starts_at.eq(changes.starts_at),
            subscriptions::ends_at.eq(changes.ends_at),
            subscriptions::status.eq(changes.status),
            subscriptions::version.eq(subscriptions::version + 1),
            subscriptions::updated_at.eq(Utc::now()),
        ))
        .returning(SubscriptionEntity::as_returning())
        .get_result::<SubscriptionEntity>(&mut conn)
        .optional()?;

        Ok(updated)
    }

    async fn apply_period_update(
        &self,
        period: SubscriptionPeriodUpdate,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        Ok(apply_period_update_on(&mut conn, &period)?)
    }

    async fn delete_subscription(&self, subscription_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = delete(subscriptions::table.find(subscription_id)).execute(&mut conn)?;

        Ok(deleted > 0)
    }

    async fn list_reminder_candidates(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<ReminderCandidateEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = subscriptions::table
            .inner_join(app_users::table)
            .inner_join(plans::table)
            .filter(subscriptions::status.eq(SubscriptionStatus::Active.to_string()))
            .filter(subscriptions::ends_at.ge(window_start))
            .filter(subscriptions::ends_at.lt(window_end))
            .order(subscriptions::ends_at.asc())
            .select((
                subscriptions::id,
                subscriptions::ends_at,
                subscriptions::last_reminder_sent_at,
                app_users::email,
                app_users::username,
                plans::name,
            ))
            .load::<(
                Uuid,
                Option<DateTime<Utc>>,
                Option<DateTime<Utc>>,
                String,
                String,
                String,
            )>(&mut conn)?;

        let candidates = rows
            .into_iter()
            .filter_map(
                |(subscription_id, ends_at, last_reminder_sent_at, user_email, username, plan_name)| {
                    Some(ReminderCandidateEntity {
                        subscription_id,
                        ends_at: ends_at?,
                        last_reminder_sent_at,
                        user_email,
                        username,
                        plan_name,
                    })
                },
            )
            .collect();

        Ok(candidates)
    }

    async fn mark_reminder_sent(
        &self,
        subscription_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(subscriptions::table.find(subscription_id))
            .set(subscriptions::last_reminder_sent_at.eq(Some(sent_at)))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn expire_lapsed(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let expired_ids = update(
            subscriptions::table
                .filter(subscriptions::status.eq(SubscriptionStatus::Active.to_string()))
                .filter(subscriptions::ends_at.le(now)),
        )
        .set((
            subscriptions::status.eq(SubscriptionStatus::Expired.to_string()),
            subscriptions::version.eq(subscriptions::version + 1),
            subscriptions::updated_at.eq(now),
        ))
        .returning(subscriptions::id)
        .get_results::<Uuid>(&mut conn)?;

        Ok(expired_ids)
    }
}
