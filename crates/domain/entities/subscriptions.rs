use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::subscriptions;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: String,
    /// Bumped on every lifecycle write; used as the optimistic concurrency token.
    pub version: i32,
    pub last_reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = subscriptions)]
pub struct InsertSubscriptionEntity {
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: String,
}

/// Full replacement of the mutable columns, applied by the admin update path.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSubscriptionEntity {
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: String,
}

/// Row used by the reminder sweep: the subscription joined with its owner and plan.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderCandidateEntity {
    pub subscription_id: Uuid,
    pub ends_at: DateTime<Utc>,
    pub last_reminder_sent_at: Option<DateTime<Utc>>,
    pub user_email: String,
    pub username: String,
    pub plan_name: String,
}
