use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::{
        plans::PlanEntity,
        subscriptions::{
            InsertSubscriptionEntity, ReminderCandidateEntity, SubscriptionEntity,
            UpdateSubscriptionEntity,
        },
    },
    value_objects::subscription_lifecycle::SubscriptionPeriodUpdate,
};

/// Lifecycle writes are compare-and-set on `(id, version)`: they return `None`
/// when the row is gone or was changed since it was read.
#[automock]
#[async_trait]
pub trait SubscriptionRepository {
    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>>;

    async fn list_subscriptions(&self) -> Result<Vec<SubscriptionEntity>>;

    async fn list_by_user_with_plan(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(SubscriptionEntity, PlanEntity)>>;

    async fn create_subscription(
        &self,
        subscription: InsertSubscriptionEntity,
    ) -> Result<SubscriptionEntity>;

    async fn update_if_version(
        &self,
        subscription_id: Uuid,
        expected_version: i32,
        changes: UpdateSubscriptionEntity,
    ) -> Result<Option<SubscriptionEntity>>;

    async fn apply_period_update(
        &self,
        update: SubscriptionPeriodUpdate,
    ) -> Result<Option<SubscriptionEntity>>;

    /// Returns `false` when no subscription had this id.
    async fn delete_subscription(&self, subscription_id: Uuid) -> Result<bool>;

    /// Active subscriptions whose end date falls in `[window_start, window_end)`.
    async fn list_reminder_candidates(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<ReminderCandidateEntity>>;

    async fn mark_reminder_sent(&self, subscription_id: Uuid, sent_at: DateTime<Utc>)
    -> Result<()>;

    /// Moves every `active` subscription with `ends_at <= now` to `expired`.
    async fn expire_lapsed(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>>;
}
