use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;

use crate::domain::value_objects::reports::DashboardStats;

/// Read-only aggregation over subscriptions.
#[automock]
#[async_trait]
pub trait ReportRepository {
    /// `since` bounds `subscriptions_last_7_days` (on start date); `top_n` caps `top_plans`.
    async fn dashboard_stats(&self, since: DateTime<Utc>, top_n: i64) -> Result<DashboardStats>;
}
