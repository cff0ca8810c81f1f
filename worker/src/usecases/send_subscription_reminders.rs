use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use crates::domain::{
    entities::subscriptions::ReminderCandidateEntity,
    repositories::{mailer::Mailer, subscriptions::SubscriptionRepository},
    value_objects::{emails::EmailTemplate, subscription_lifecycle::reminder_window},
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

const MAX_REPORTED_IDS: usize = 20;

#[derive(Debug, Clone)]
pub struct SendSubscriptionRemindersParams {
    pub reference: DateTime<Utc>,
    pub horizon_days: i64,
    pub utc_offset: FixedOffset,
}

#[derive(Debug, Clone, Default)]
pub struct SendSubscriptionRemindersResult {
    pub scanned: usize,
    pub sent: usize,
    pub skipped_already_reminded: usize,
    pub failed: usize,
    pub sent_ids: Vec<Uuid>,
    pub failed_ids: Vec<Uuid>,
}

/// Daily sweep: emails members whose active subscription ends on the day
/// `horizon_days` ahead, at most once per day per subscription.
pub struct SendSubscriptionRemindersUseCase {
    repository: Arc<dyn SubscriptionRepository + Send + Sync>,
    mailer: Arc<dyn Mailer + Send + Sync>,
}

impl SendSubscriptionRemindersUseCase {
    pub fn new(
        repository: Arc<dyn SubscriptionRepository + Send + Sync>,
        mailer: Arc<dyn Mailer + Send + Sync>,
    ) -> Self {
        Self { repository, mailer }
    }

    pub async fn run(
        &self,
        params: SendSubscriptionRemindersParams,
    ) -> Result<SendSubscriptionRemindersResult> {
        let (window_start, window_end) =
            reminder_window(params.reference, params.horizon_days, params.utc_offset)?;
        let (today_start, _) = reminder_window(params.reference, 0, params.utc_offset)?;

        let candidates = self
            .repository
            .list_reminder_candidates(window_start, window_end)
            .await?;

        let mut result = SendSubscriptionRemindersResult {
            scanned: candidates.len(),
            ..Default::default()
        };

        for candidate in candidates {
            if candidate
                .last_reminder_sent_at
                .is_some_and(|sent_at| sent_at >= today_start)
            {
                result.skipped_already_reminded += 1;
                continue;
            }

            let template = reminder_template(&candidate, params.utc_offset);
            if let Err(err) = self.mailer.send(&candidate.user_email, &template).await {
                error!(
                    subscription_id = %candidate.subscription_id,
                    mail_error = ?err,
                    "subscription_reminders: failed to send reminder"
                );
                result.failed += 1;
                if result.failed_ids.len() < MAX_REPORTED_IDS {
                    result.failed_ids.push(candidate.subscription_id);
                }
                continue;
            }

            if let Err(err) = self
                .repository
                .mark_reminder_sent(candidate.subscription_id, params.reference)
                .await
            {
                warn!(
                    subscription_id = %candidate.subscription_id,
                    db_error = ?err,
                    "subscription_reminders: reminder sent but not recorded"
                );
            }

            result.sent += 1;
            if result.sent_ids.len() < MAX_REPORTED_IDS {
                result.sent_ids.push(candidate.subscription_id);
            }
        }

        info!(
            scanned = result.scanned,
            sent = result.sent,
            skipped_already_reminded = result.skipped_already_reminded,
            failed = result.failed,
            %window_start,
            %window_end,
            "subscription_reminders: completed"
        );

        Ok(result)
    }
}

fn reminder_template(candidate: &ReminderCandidateEntity, utc_offset: FixedOffset) -> EmailTemplate {
    EmailTemplate::SubscriptionReminder {
        username: candidate.username.clone(),
        plan_name: candidate.plan_name.clone(),
        ends_on: candidate.ends_at.with_timezone(&utc_offset).date_naive(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::{NaiveDate, TimeZone};
    use crates::domain::repositories::{
        mailer::MockMailer, subscriptions::MockSubscriptionRepository,
    };

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn candidate(ends_at: DateTime<Utc>, last_reminder_sent_at: Option<DateTime<Utc>>) -> ReminderCandidateEntity {
        ReminderCandidateEntity {
            subscription_id: Uuid::new_v4(),
            ends_at,
            last_reminder_sent_at,
            user_email: "ana@example.com".to_string(),
            username: "ana".to_string(),
            plan_name: "Monthly".to_string(),
        }
    }

    fn params() -> SendSubscriptionRemindersParams {
        SendSubscriptionRemindersParams {
            reference: at(2024, 3, 6, 8),
            horizon_days: 3,
            utc_offset: FixedOffset::east_opt(0).unwrap(),
        }
    }

    #[tokio::test]
    async fn reminds_subscriptions_ending_three_days_ahead() {
        let due = candidate(at(2024, 3, 9, 17), None);
        let due_id = due.subscription_id;

        let mut repository = MockSubscriptionRepository::new();
        repository
            .expect_list_reminder_candidates()
            .withf(|start, end| *start == at(2024, 3, 9, 0) && *end == at(2024, 3, 10, 0))
            .times(1)
            .returning(move |_, _| Ok(vec![due.clone()]));
        repository
            .expect_mark_reminder_sent()
            .withf(move |id, sent_at| *id == due_id && *sent_at == at(2024, 3, 6, 8))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|to, template| {
                to == "ana@example.com"
                    && *template
                        == EmailTemplate::SubscriptionReminder {
                            username: "ana".to_string(),
                            plan_name: "Monthly".to_string(),
                            ends_on: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
                        }
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let result = SendSubscriptionRemindersUseCase::new(Arc::new(repository), Arc::new(mailer))
            .run(params())
            .await
            .unwrap();

        assert_eq!(result.scanned, 1);
        assert_eq!(result.sent, 1);
        assert_eq!(result.sent_ids, vec![due_id]);
    }

    #[tokio::test]
    async fn second_run_on_the_same_day_sends_nothing() {
        let reminded_this_morning = candidate(at(2024, 3, 9, 17), Some(at(2024, 3, 6, 6)));
        let reminded_yesterday = candidate(at(2024, 3, 9, 20), Some(at(2024, 3, 5, 23)));

        let mut repository = MockSubscriptionRepository::new();
        repository
            .expect_list_reminder_candidates()
            .returning(move |_, _| Ok(vec![reminded_this_morning.clone(), reminded_yesterday.clone()]));
        repository
            .expect_mark_reminder_sent()
            .times(1)
            .returning(|_, _| Ok(()));

        let mut mailer = MockMailer::new();
        mailer.expect_send().times(1).returning(|_, _| Ok(()));

        let result = SendSubscriptionRemindersUseCase::new(Arc::new(repository), Arc::new(mailer))
            .run(params())
            .await
            .unwrap();

        assert_eq!(result.skipped_already_reminded, 1);
        assert_eq!(result.sent, 1);
    }

    #[tokio::test]
    async fn mail_failure_is_counted_and_not_recorded() {
        let due = candidate(at(2024, 3, 9, 10), None);
        let due_id = due.subscription_id;

        let mut repository = MockSubscriptionRepository::new();
        repository
            .expect_list_reminder_candidates()
            .returning(move |_, _| Ok(vec![due.clone()]));
        repository.expect_mark_reminder_sent().never();

        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .returning(|_, _| Err(anyhow!("connection reset")));

        let result = SendSubscriptionRemindersUseCase::new(Arc::new(repository), Arc::new(mailer))
            .run(params())
            .await
            .unwrap();

        assert_eq!(result.failed, 1);
        assert_eq!(result.failed_ids, vec![due_id]);
        assert_eq!(result.sent, 0);
    }

    #[tokio::test]
    async fn store_failure_fails_the_sweep() {
        let mut repository = MockSubscriptionRepository::new();
        repository
            .expect_list_reminder_candidates()
            .returning(|_, _| Err(anyhow!("database unavailable")));

        let mut mailer = MockMailer::new();
        mailer.expect_send().never();

        let result = SendSubscriptionRemindersUseCase::new(Arc::new(repository), Arc::new(mailer))
            .run(params())
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn window_follows_the_configured_offset() {
        let mut repository = MockSubscriptionRepository::new();
        // 23:30 UTC on the 5th is already the 6th at UTC+1
        repository
            .expect_list_reminder_candidates()
            .withf(|start, end| *start == at(2024, 3, 8, 23) && *end == at(2024, 3, 9, 23))
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let result = SendSubscriptionRemindersUseCase::new(
            Arc::new(repository),
            Arc::new(MockMailer::new()),
        )
        .run(SendSubscriptionRemindersParams {
            reference: Utc.with_ymd_and_hms(2024, 3, 5, 23, 30, 0).unwrap(),
            horizon_days: 3,
            utc_offset: FixedOffset::east_opt(3600).unwrap(),
        })
        .await
        .unwrap();

        assert_eq!(result.scanned, 0);
    }
}
