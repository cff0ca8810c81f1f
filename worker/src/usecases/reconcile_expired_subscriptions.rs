use anyhow::Result;
use chrono::{DateTime, Utc};
use crates::domain::repositories::subscriptions::SubscriptionRepository;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct ReconcileExpiredSubscriptionsResult {
    pub expired: usize,
    pub expired_ids: Vec<Uuid>,
}

/// Flips active subscriptions past their end date to `expired`.
pub struct ReconcileExpiredSubscriptionsUseCase {
    repository: Arc<dyn SubscriptionRepository + Send + Sync>,
}

impl ReconcileExpiredSubscriptionsUseCase {
    pub fn new(repository: Arc<dyn SubscriptionRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<ReconcileExpiredSubscriptionsResult> {
        let expired_ids = self.repository.expire_lapsed(now).await?;

        info!(
            expired = expired_ids.len(),
            %now,
            "expiry_reconcile: completed"
        );

        Ok(ReconcileExpiredSubscriptionsResult {
            expired: expired_ids.len(),
            expired_ids,
        })
    }
}
