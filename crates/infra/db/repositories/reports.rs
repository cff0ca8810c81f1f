use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, dsl::count, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::subscriptions},
};
use domain::{
    repositories::reports::ReportRepository,
    value_objects::{
        enums::subscription_statuses::SubscriptionStatus,
        reports::{DashboardStats, PlanSubscriptionCount},
    },
};

pub struct ReportPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ReportPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ReportRepository for ReportPostgres {
    async fn dashboard_stats(&self, since: DateTime<Utc>, top_n: i64) -> Result<DashboardStats> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // One read-only transaction so the four figures describe the same snapshot.
        let stats = conn.build_transaction().read_only().repeatable_read().run::<
            DashboardStats,
            diesel::result::Error,
            _,
        >(|conn| {
            let total_subscriptions = subscriptions::table
                .count()
                .get_result::<i64>(conn)?;

            let subscriptions_last_7_days = subscriptions::table
                .filter(subscriptions::starts_at.ge(since))
                .count()
                .get_result::<i64>(conn)?;

            let active_subscriptions = subscriptions::table
                .filter(subscriptions::status.eq(SubscriptionStatus::Active.to_string()))
                .count()
                .get_result::<i64>(conn)?;

            let top_plans = subscriptions::table
                .group_by(subscriptions::plan_id)
                .select((subscriptions::plan_id, count(subscriptions::id)))
                .order(count(subscriptions::id).desc())
                .limit(top_n)
                .load::<(Uuid, i64)>(conn)?
                .into_iter()
                .map(|(plan_id, subscription_count)| PlanSubscriptionCount {
                    plan_id,
                    subscription_count,
                })
                .collect();

            Ok(DashboardStats {
                total_subscriptions,
                subscriptions_last_7_days,
                active_subscriptions,
                top_plans,
            })
        })?;

        Ok(stats)
    }
}
