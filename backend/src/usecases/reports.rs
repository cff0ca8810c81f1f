use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use crates::domain::{
    repositories::reports::ReportRepository,
    value_objects::reports::{DashboardStats, RECENT_SUBSCRIPTIONS_DAYS, TOP_PLANS_LIMIT},
};
use tracing::error;

use super::{UseCaseError, UseCaseResult};

pub struct ReportUseCase<R>
where
    R: ReportRepository + Send + Sync + 'static,
{
    report_repo: Arc<R>,
}

impl<R> ReportUseCase<R>
where
    R: ReportRepository + Send + Sync + 'static,
{
    pub fn new(report_repo: Arc<R>) -> Self {
        Self { report_repo }
    }

    pub async fn dashboard_stats(&self, now: DateTime<Utc>) -> UseCaseResult<DashboardStats> {
        let since = now - Duration::days(RECENT_SUBSCRIPTIONS_DAYS);

        self.report_repo
            .dashboard_stats(since, TOP_PLANS_LIMIT)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "reports: failed to compute dashboard stats");
                UseCaseError::Internal(err)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crates::domain::{
        repositories::reports::MockReportRepository, value_objects::reports::PlanSubscriptionCount,
    };
    use uuid::Uuid;

    #[tokio::test]
    async fn asks_for_last_week_and_top_five() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let expected_since = Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap();
        let plan_id = Uuid::new_v4();

        let mut report_repo = MockReportRepository::new();
        report_repo
            .expect_dashboard_stats()
            .withf(move |since, top_n| *since == expected_since && *top_n == 5)
            .times(1)
            .returning(move |_, _| {
                Ok(DashboardStats {
                    total_subscriptions: 4,
                    subscriptions_last_7_days: 2,
                    active_subscriptions: 3,
                    top_plans: vec![PlanSubscriptionCount {
                        plan_id,
                        subscription_count: 4,
                    }],
                })
            });

        let stats = ReportUseCase::new(Arc::new(report_repo))
            .dashboard_stats(now)
            .await
            .unwrap();

        assert_eq!(stats.total_subscriptions, 4);
        assert_eq!(stats.top_plans[0].plan_id, plan_id);
    }

    #[tokio::test]
    async fn store_failure_is_internal() {
        let mut report_repo = MockReportRepository::new();
        report_repo
            .expect_dashboard_stats()
            .returning(|_, _| Err(anyhow::anyhow!("connection refused")));

        let err = ReportUseCase::new(Arc::new(report_repo))
            .dashboard_stats(Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, UseCaseError::Internal(_)));
    }
}
