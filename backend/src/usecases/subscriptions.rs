use std::sync::Arc;

use chrono::{DateTime, Utc};
use crates::domain::{
    entities::{
        plans::PlanEntity,
        subscriptions::{InsertSubscriptionEntity, SubscriptionEntity, UpdateSubscriptionEntity},
    },
    repositories::{
        app_users::AppUserRepository, plans::PlanRepository,
        subscriptions::SubscriptionRepository,
    },
    value_objects::{
        advisories::{Advisory, advisories_for},
        enums::subscription_statuses::SubscriptionStatus,
        plans::PlanDto,
        subscription_lifecycle::{self, add_plan_duration},
        subscriptions::{
            CreateSubscriptionRequest, ExpiryProjection, MySubscriptionDto, SubscriptionDto,
            UpdateSubscriptionRequest,
        },
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::{MAX_CAS_ATTEMPTS, UseCaseError, UseCaseResult};
use crate::auth::AuthUser;

pub struct SubscriptionUseCase<S, P, U>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    U: AppUserRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    plan_repo: Arc<P>,
    user_repo: Arc<U>,
}

impl<S, P, U> SubscriptionUseCase<S, P, U>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    U: AppUserRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>, plan_repo: Arc<P>, user_repo: Arc<U>) -> Self {
        Self {
            subscription_repo,
            plan_repo,
            user_repo,
        }
    }

    pub async fn list_subscriptions(&self) -> UseCaseResult<Vec<SubscriptionDto>> {
        let subscriptions = self
            .subscription_repo
            .list_subscriptions()
            .await
            .map_err(|err| {
                error!(db_error = ?err, "subscriptions: failed to list subscriptions");
                UseCaseError::Internal(err)
            })?;

        subscriptions
            .into_iter()
            .map(|entity| SubscriptionDto::try_from(entity).map_err(UseCaseError::Internal))
            .collect()
    }

    pub async fn get_subscription(&self, subscription_id: Uuid) -> UseCaseResult<SubscriptionDto> {
        let subscription = self.load_subscription(subscription_id).await?;
        Ok(SubscriptionDto::try_from(subscription)?)
    }

    pub async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> UseCaseResult<SubscriptionDto> {
        request.validate()?;
        let (Some(user_id), Some(plan_id)) = (request.user_id, request.plan_id) else {
            return Err(UseCaseError::Validation(
                "userId and planId are required".to_string(),
            ));
        };

        self.ensure_user_exists(user_id).await?;
        let plan = self.load_plan(plan_id).await?;

        let status = request.status.unwrap_or_default();
        let starts_at = request.start_date.unwrap_or_else(Utc::now);
        let ends_at = match (request.end_date, status) {
            (Some(ends_at), _) => Some(ends_at),
            (None, SubscriptionStatus::Pending) => None,
            (None, _) => Some(add_plan_duration(starts_at, plan.duration_days)?),
        };
        ensure_period_is_ordered(starts_at, ends_at)?;

        let created = self
            .subscription_repo
            .create_subscription(InsertSubscriptionEntity {
                user_id,
                plan_id,
                starts_at,
                ends_at,
                status: status.to_string(),
            })
            .await
            .map_err(|err| {
                error!(%user_id, %plan_id, db_error = ?err, "subscriptions: failed to create subscription");
                UseCaseError::Internal(err)
            })?;

        info!(
            subscription_id = %created.id,
            %user_id,
            %plan_id,
            %status,
            "subscriptions: subscription created"
        );
        Ok(SubscriptionDto::try_from(created)?)
    }

    /// Admin edit. Status changes must follow [`SubscriptionStatus::can_transition_to`].
    pub async fn update_subscription(
        &self,
        subscription_id: Uuid,
        request: UpdateSubscriptionRequest,
    ) -> UseCaseResult<SubscriptionDto> {
        request.validate()?;

        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let current = self.load_subscription(subscription_id).await?;
            let current_status = parse_status(&current)?;
            let next_status = request.status.unwrap_or(current_status);

            if !current_status.can_transition_to(next_status) {
                return Err(UseCaseError::Validation(format!(
                    "cannot change status from {current_status} to {next_status}"
                )));
            }

            let user_id = request.user_id.unwrap_or(current.user_id);
            let plan_id = request.plan_id.unwrap_or(current.plan_id);
            if user_id != current.user_id {
                self.ensure_user_exists(user_id).await?;
            }
            let mut plan = if plan_id != current.plan_id {
                Some(self.load_plan(plan_id).await?)
            } else {
                None
            };

            let starts_at = request.start_date.unwrap_or(current.starts_at);
            // only a pending subscription may lack an end date
            let ends_at = match request.end_date.or(current.ends_at) {
                Some(ends_at) => Some(ends_at),
                None if next_status == SubscriptionStatus::Pending => None,
                None => {
                    let plan = match plan.take() {
                        Some(plan) => plan,
                        None => self.load_plan(plan_id).await?,
                    };
                    Some(add_plan_duration(starts_at, plan.duration_days)?)
                }
            };
            ensure_period_is_ordered(starts_at, ends_at)?;

            let changes = UpdateSubscriptionEntity {
                user_id,
                plan_id,
                starts_at,
                ends_at,
                status: next_status.to_string(),
            };

            match self
                .subscription_repo
                .update_if_version(subscription_id, current.version, changes)
                .await
                .map_err(|err| {
                    error!(%subscription_id, db_error = ?err, "subscriptions: failed to update subscription");
                    UseCaseError::Internal(err)
                })? {
                Some(updated) => {
                    info!(%subscription_id, status = %next_status, "subscriptions: subscription updated");
                    return Ok(SubscriptionDto::try_from(updated)?);
                }
                None => warn!(%subscription_id, attempt, "subscriptions: concurrent update detected, retrying"),
            }
        }

        Err(lost_race(subscription_id))
    }

    pub async fn delete_subscription(&self, subscription_id: Uuid) -> UseCaseResult<()> {
        let deleted = self
            .subscription_repo
            .delete_subscription(subscription_id)
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "subscriptions: failed to delete subscription");
                UseCaseError::Internal(err)
            })?;

        if !deleted {
            return Err(not_found(subscription_id));
        }

        info!(%subscription_id, "subscriptions: subscription deleted");
        Ok(())
    }

    /// The caller's subscriptions with their plan and the expiry projection at `reference`.
    pub async fn my_subscriptions(
        &self,
        user_id: Uuid,
        reference: DateTime<Utc>,
    ) -> UseCaseResult<Vec<MySubscriptionDto>> {
        let rows = self
            .subscription_repo
            .list_by_user_with_plan(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to list user subscriptions");
                UseCaseError::Internal(err)
            })?;

        rows.into_iter()
            .map(|(subscription, plan)| -> UseCaseResult<MySubscriptionDto> {
                let expiry = subscription
                    .ends_at
                    .map(|ends_at| ExpiryProjection::at(ends_at, reference));
                Ok(MySubscriptionDto {
                    subscription: SubscriptionDto::try_from(subscription)?,
                    plan: PlanDto::from(plan),
                    expiry,
                })
            })
            .collect()
    }

    pub async fn my_advisories(
        &self,
        user_id: Uuid,
        reference: DateTime<Utc>,
    ) -> UseCaseResult<Vec<Advisory>> {
        let subscriptions: Vec<SubscriptionDto> = self
            .my_subscriptions(user_id, reference)
            .await?
            .into_iter()
            .map(|entry| entry.subscription)
            .collect();

        Ok(advisories_for(&subscriptions, reference))
    }

    /// Extends the subscription by one plan duration from its current end date.
    pub async fn renew(
        &self,
        subscription_id: Uuid,
        actor: &AuthUser,
    ) -> UseCaseResult<SubscriptionDto> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let subscription = self.load_subscription(subscription_id).await?;

            if !actor.is_admin() && subscription.user_id != actor.user_id {
                warn!(
                    %subscription_id,
                    actor_id = %actor.user_id,
                    "subscriptions: renew refused for non-owner"
                );
                return Err(UseCaseError::Forbidden(
                    "not allowed to renew this subscription".to_string(),
                ));
            }

            let plan = self.load_plan(subscription.plan_id).await?;
            let period = subscription_lifecycle::renew(&subscription, &plan, Utc::now())?;

            match self
                .subscription_repo
                .apply_period_update(period)
                .await
                .map_err(|err| {
                    error!(%subscription_id, db_error = ?err, "subscriptions: failed to renew subscription");
                    UseCaseError::Internal(err)
                })? {
                Some(renewed) => {
                    info!(
                        %subscription_id,
                        ends_at = ?renewed.ends_at,
                        "subscriptions: subscription renewed"
                    );
                    return Ok(SubscriptionDto::try_from(renewed)?);
                }
                None => warn!(%subscription_id, attempt, "subscriptions: concurrent renewal detected, retrying"),
            }
        }

        Err(lost_race(subscription_id))
    }

    async fn load_subscription(&self, subscription_id: Uuid) -> UseCaseResult<SubscriptionEntity> {
        self.subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "subscriptions: failed to load subscription");
                UseCaseError::Internal(err)
            })?
            .ok_or_else(|| not_found(subscription_id))
    }

    async fn load_plan(&self, plan_id: Uuid) -> UseCaseResult<PlanEntity> {
        self.plan_repo
            .find_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "subscriptions: failed to load plan");
                UseCaseError::Internal(err)
            })?
            .ok_or_else(|| UseCaseError::NotFound(format!("plan {plan_id} not found")))
    }

    async fn ensure_user_exists(&self, user_id: Uuid) -> UseCaseResult<()> {
        self.user_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to load user");
                UseCaseError::Internal(err)
            })?
            .map(|_| ())
            .ok_or_else(|| UseCaseError::NotFound(format!("user {user_id} not found")))
    }
}

fn parse_status(subscription: &SubscriptionEntity) -> UseCaseResult<SubscriptionStatus> {
    SubscriptionStatus::from_str(&subscription.status).ok_or_else(|| {
        UseCaseError::Internal(anyhow::anyhow!(
            "subscription {} has unknown status {:?}",
            subscription.id,
            subscription.status
        ))
    })
}

fn ensure_period_is_ordered(
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
) -> UseCaseResult<()> {
    match ends_at {
        Some(ends_at) if ends_at < starts_at => Err(UseCaseError::Validation(
            "endDate must not be before startDate".to_string(),
        )),
        _ => Ok(()),
    }
}

fn not_found(subscription_id: Uuid) -> UseCaseError {
    UseCaseError::NotFound(format!("subscription {subscription_id} not found"))
}

fn lost_race(subscription_id: Uuid) -> UseCaseError {
    error!(%subscription_id, "subscriptions: giving up after repeated concurrent writes");
    UseCaseError::Conflict(format!(
        "subscription {subscription_id} was modified concurrently, try again"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use crates::domain::{
        entities::app_users::AppUserEntity,
        repositories::{
            app_users::MockAppUserRepository, plans::MockPlanRepository,
            subscriptions::MockSubscriptionRepository,
        },
        value_objects::{
            advisories::AdvisoryLevel, enums::user_roles::UserRole,
            subscription_lifecycle::ExpiryStatus,
        },
    };
    use mockall::predicate::eq;

    fn sample_plan(id: Uuid, duration_days: i32) -> PlanEntity {
        let now = Utc::now();
        PlanEntity {
            id,
            name: "Monthly".to_string(),
            description: "Unlimited access".to_string(),
            price_minor: 3500,
            duration_days,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_subscription(
        user_id: Uuid,
        plan_id: Uuid,
        status: SubscriptionStatus,
        ends_at: Option<DateTime<Utc>>,
    ) -> SubscriptionEntity {
        let now = Utc::now();
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id,
            plan_id,
            starts_at: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            ends_at,
            status: status.to_string(),
            version: 4,
            last_reminder_sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_user(id: Uuid) -> AppUserEntity {
        let now = Utc::now();
        AppUserEntity {
            id,
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: "hash".to_string(),
            address: None,
            phone: None,
            role: "user".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn actor(user_id: Uuid, role: UserRole) -> AuthUser {
        AuthUser {
            user_id,
            email: None,
            role,
        }
    }

    fn usecase(
        subscription_repo: MockSubscriptionRepository,
        plan_repo: MockPlanRepository,
        user_repo: MockAppUserRepository,
    ) -> SubscriptionUseCase<MockSubscriptionRepository, MockPlanRepository, MockAppUserRepository>
    {
        SubscriptionUseCase::new(
            Arc::new(subscription_repo),
            Arc::new(plan_repo),
            Arc::new(user_repo),
        )
    }

    #[tokio::test]
    async fn renew_extends_from_current_end_date() {
        let owner = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let ends_at = Utc.with_ymd_and_hms(2024, 1, 31, 10, 0, 0).unwrap();
        let subscription =
            sample_subscription(owner, plan_id, SubscriptionStatus::Active, Some(ends_at));
        let subscription_id = subscription.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut plan_repo = MockPlanRepository::new();

        let stored = subscription.clone();
        subscription_repo
            .expect_find_by_id()
            .with(eq(subscription_id))
            .returning(move |_| Ok(Some(stored.clone())));
        plan_repo
            .expect_find_by_id()
            .with(eq(plan_id))
            .returning(move |_| Ok(Some(sample_plan(plan_id, 30))));

        let expected_end = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        subscription_repo
            .expect_apply_period_update()
            .withf(move |period| {
                period.expected_version == 4
                    && period.status == SubscriptionStatus::Active
                    && period.ends_at == Some(expected_end)
            })
            .times(1)
            .returning(move |period| {
                Ok(Some(SubscriptionEntity {
                    ends_at: period.ends_at,
                    status: period.status.to_string(),
                    version: 5,
                    ..subscription.clone()
                }))
            });

        let usecase = usecase(subscription_repo, plan_repo, MockAppUserRepository::new());

        let renewed = usecase
            .renew(subscription_id, &actor(owner, UserRole::User))
            .await
            .unwrap();

        assert_eq!(renewed.end_date, Some(expected_end));
        assert_eq!(renewed.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn renew_by_stranger_is_forbidden_and_writes_nothing() {
        let plan_id = Uuid::new_v4();
        let subscription = sample_subscription(
            Uuid::new_v4(),
            plan_id,
            SubscriptionStatus::Active,
            Some(Utc::now() + Duration::days(3)),
        );
        let subscription_id = subscription.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(subscription.clone())));
        subscription_repo.expect_apply_period_update().never();

        let usecase = usecase(
            subscription_repo,
            MockPlanRepository::new(),
            MockAppUserRepository::new(),
        );

        let err = usecase
            .renew(subscription_id, &actor(Uuid::new_v4(), UserRole::User))
            .await
            .unwrap_err();

        assert!(matches!(err, UseCaseError::Forbidden(_)));
    }

    #[tokio::test]
    async fn admin_can_renew_someone_elses_subscription() {
        let plan_id = Uuid::new_v4();
        let subscription = sample_subscription(
            Uuid::new_v4(),
            plan_id,
            SubscriptionStatus::Expired,
            Some(Utc::now() - Duration::days(10)),
        );
        let subscription_id = subscription.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut plan_repo = MockPlanRepository::new();
        let stored = subscription.clone();
        subscription_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        plan_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(sample_plan(plan_id, 30))));
        subscription_repo
            .expect_apply_period_update()
            .returning(move |period| {
                Ok(Some(SubscriptionEntity {
                    ends_at: period.ends_at,
                    status: period.status.to_string(),
                    ..subscription.clone()
                }))
            });

        let usecase = usecase(subscription_repo, plan_repo, MockAppUserRepository::new());

        let renewed = usecase
            .renew(subscription_id, &actor(Uuid::new_v4(), UserRole::Admin))
            .await
            .unwrap();

        assert_eq!(renewed.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn renew_of_missing_subscription_is_not_found() {
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo.expect_find_by_id().returning(|_| Ok(None));

        let usecase = usecase(
            subscription_repo,
            MockPlanRepository::new(),
            MockAppUserRepository::new(),
        );

        let err = usecase
            .renew(Uuid::new_v4(), &actor(Uuid::new_v4(), UserRole::Admin))
            .await
            .unwrap_err();

        assert!(matches!(err, UseCaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn renew_gives_up_with_conflict_after_repeated_lost_races() {
        let owner = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let subscription = sample_subscription(
            owner,
            plan_id,
            SubscriptionStatus::Active,
            Some(Utc::now() + Duration::days(5)),
        );
        let subscription_id = subscription.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut plan_repo = MockPlanRepository::new();
        subscription_repo
            .expect_find_by_id()
            .times(MAX_CAS_ATTEMPTS)
            .returning(move |_| Ok(Some(subscription.clone())));
        plan_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(sample_plan(plan_id, 30))));
        subscription_repo
            .expect_apply_period_update()
            .times(MAX_CAS_ATTEMPTS)
            .returning(|_| Ok(None));

        let usecase = usecase(subscription_repo, plan_repo, MockAppUserRepository::new());

        let err = usecase
            .renew(subscription_id, &actor(owner, UserRole::User))
            .await
            .unwrap_err();

        assert!(matches!(err, UseCaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn create_defaults_to_pending_without_end_date() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();

        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut plan_repo = MockPlanRepository::new();
        let mut user_repo = MockAppUserRepository::new();

        user_repo
            .expect_find_by_id()
            .with(eq(user_id))
            .returning(|id| Ok(Some(sample_user(id))));
        plan_repo
            .expect_find_by_id()
            .with(eq(plan_id))
            .returning(|id| Ok(Some(sample_plan(id, 30))));
        subscription_repo
            .expect_create_subscription()
            .withf(|insert| insert.status == "pending" && insert.ends_at.is_none())
            .returning(|insert| {
                let now = Utc::now();
                Ok(SubscriptionEntity {
                    id: Uuid::new_v4(),
                    user_id: insert.user_id,
                    plan_id: insert.plan_id,
                    starts_at: insert.starts_at,
                    ends_at: insert.ends_at,
                    status: insert.status,
                    version: 0,
                    last_reminder_sent_at: None,
                    created_at: now,
                    updated_at: now,
                })
            });

        let usecase = usecase(subscription_repo, plan_repo, user_repo);
        let request = CreateSubscriptionRequest {
            user_id: Some(user_id),
            plan_id: Some(plan_id),
            start_date: None,
            end_date: None,
            status: None,
        };

        let created = usecase.create_subscription(request).await.unwrap();

        assert_eq!(created.status, SubscriptionStatus::Pending);
        assert_eq!(created.end_date, None);
    }

    #[tokio::test]
    async fn create_active_without_end_date_computes_it_from_plan() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let starts_at = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let expected_end = Utc.with_ymd_and_hms(2024, 1, 31, 10, 0, 0).unwrap();

        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut plan_repo = MockPlanRepository::new();
        let mut user_repo = MockAppUserRepository::new();

        user_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_user(id))));
        plan_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_plan(id, 30))));
        subscription_repo
            .expect_create_subscription()
            .withf(move |insert| insert.ends_at == Some(expected_end))
            .returning(move |insert| {
                Ok(SubscriptionEntity {
                    starts_at: insert.starts_at,
                    ends_at: insert.ends_at,
                    status: insert.status,
                    ..sample_subscription(insert.user_id, insert.plan_id, SubscriptionStatus::Active, None)
                })
            });

        let usecase = usecase(subscription_repo, plan_repo, user_repo);
        let request = CreateSubscriptionRequest {
            user_id: Some(user_id),
            plan_id: Some(plan_id),
            start_date: Some(starts_at),
            end_date: None,
            status: Some(SubscriptionStatus::Active),
        };

        let created = usecase.create_subscription(request).await.unwrap();

        assert_eq!(created.end_date, Some(expected_end));
    }

    #[tokio::test]
    async fn create_for_unknown_user_is_not_found() {
        let mut user_repo = MockAppUserRepository::new();
        user_repo.expect_find_by_id().returning(|_| Ok(None));
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo.expect_create_subscription().never();

        let usecase = usecase(subscription_repo, MockPlanRepository::new(), user_repo);
        let request = CreateSubscriptionRequest {
            user_id: Some(Uuid::new_v4()),
            plan_id: Some(Uuid::new_v4()),
            start_date: None,
            end_date: None,
            status: None,
        };

        let err = usecase.create_subscription(request).await.unwrap_err();
        assert!(matches!(err, UseCaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_without_plan_id_is_a_validation_error() {
        let usecase = usecase(
            MockSubscriptionRepository::new(),
            MockPlanRepository::new(),
            MockAppUserRepository::new(),
        );
        let request = CreateSubscriptionRequest {
            user_id: Some(Uuid::new_v4()),
            plan_id: None,
            start_date: None,
            end_date: None,
            status: None,
        };

        let err = usecase.create_subscription(request).await.unwrap_err();
        assert!(matches!(err, UseCaseError::Validation(_)));
    }

    #[tokio::test]
    async fn update_rejects_leaving_a_terminal_status() {
        let subscription = sample_subscription(
            Uuid::new_v4(),
            Uuid::new_v4(),
            SubscriptionStatus::Cancelled,
            Some(Utc::now()),
        );
        let subscription_id = subscription.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(subscription.clone())));
        subscription_repo.expect_update_if_version().never();

        let usecase = usecase(
            subscription_repo,
            MockPlanRepository::new(),
            MockAppUserRepository::new(),
        );
        let request = UpdateSubscriptionRequest {
            status: Some(SubscriptionStatus::Active),
            ..Default::default()
        };

        let err = usecase
            .update_subscription(subscription_id, request)
            .await
            .unwrap_err();
        assert!(matches!(err, UseCaseError::Validation(_)));
    }

    #[tokio::test]
    async fn update_retries_after_a_lost_version_check() {
        let subscription = sample_subscription(
            Uuid::new_v4(),
            Uuid::new_v4(),
            SubscriptionStatus::Active,
            Some(Utc::now() + Duration::days(10)),
        );
        let subscription_id = subscription.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        let stored = subscription.clone();
        subscription_repo
            .expect_find_by_id()
            .times(2)
            .returning(move |_| Ok(Some(stored.clone())));

        let mut seq = mockall::Sequence::new();
        subscription_repo
            .expect_update_if_version()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(None));
        subscription_repo
            .expect_update_if_version()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, _, changes| {
                Ok(Some(SubscriptionEntity {
                    status: changes.status,
                    ..subscription.clone()
                }))
            });

        let usecase = usecase(
            subscription_repo,
            MockPlanRepository::new(),
            MockAppUserRepository::new(),
        );
        let request = UpdateSubscriptionRequest {
            status: Some(SubscriptionStatus::Cancelled),
            ..Default::default()
        };

        let updated = usecase
            .update_subscription(subscription_id, request)
            .await
            .unwrap();
        assert_eq!(updated.status, SubscriptionStatus::Cancelled);
    }

    #[tokio::test]
    async fn activating_a_pending_subscription_fills_in_its_end_date() {
        let plan_id = Uuid::new_v4();
        let subscription =
            sample_subscription(Uuid::new_v4(), plan_id, SubscriptionStatus::Pending, None);
        let subscription_id = subscription.id;
        let expected_end = Utc.with_ymd_and_hms(2024, 1, 31, 10, 0, 0).unwrap();

        let mut subscription_repo = MockSubscriptionRepository::new();
        let stored = subscription.clone();
        subscription_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        subscription_repo
            .expect_update_if_version()
            .withf(move |_, version, changes| {
                *version == 4
                    && changes.status == "active"
                    && changes.ends_at == Some(expected_end)
            })
            .times(1)
            .returning(move |_, _, changes| {
                Ok(Some(SubscriptionEntity {
                    status: changes.status,
                    ends_at: changes.ends_at,
                    version: 5,
                    ..subscription.clone()
                }))
            });

        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .with(eq(plan_id))
            .times(1)
            .returning(move |_| Ok(Some(sample_plan(plan_id, 30))));

        let usecase = usecase(subscription_repo, plan_repo, MockAppUserRepository::new());
        let request = UpdateSubscriptionRequest {
            status: Some(SubscriptionStatus::Active),
            ..Default::default()
        };

        let updated = usecase
            .update_subscription(subscription_id, request)
            .await
            .unwrap();

        assert_eq!(updated.status, SubscriptionStatus::Active);
        assert_eq!(updated.end_date, Some(expected_end));
    }

    #[tokio::test]
    async fn pending_edit_keeps_the_end_date_empty() {
        let subscription = sample_subscription(
            Uuid::new_v4(),
            Uuid::new_v4(),
            SubscriptionStatus::Pending,
            None,
        );
        let subscription_id = subscription.id;
        let new_start = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();

        let mut subscription_repo = MockSubscriptionRepository::new();
        let stored = subscription.clone();
        subscription_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        subscription_repo
            .expect_update_if_version()
            .withf(move |_, _, changes| changes.status == "pending" && changes.ends_at.is_none())
            .times(1)
            .returning(move |_, _, changes| {
                Ok(Some(SubscriptionEntity {
                    starts_at: changes.starts_at,
                    ..subscription.clone()
                }))
            });

        let mut plan_repo = MockPlanRepository::new();
        plan_repo.expect_find_by_id().never();

        let usecase = usecase(subscription_repo, plan_repo, MockAppUserRepository::new());
        let request = UpdateSubscriptionRequest {
            start_date: Some(new_start),
            ..Default::default()
        };

        let updated = usecase
            .update_subscription(subscription_id, request)
            .await
            .unwrap();
        assert_eq!(updated.end_date, None);
    }

    #[tokio::test]
    async fn update_rejects_end_before_start() {
        let subscription = sample_subscription(
            Uuid::new_v4(),
            Uuid::new_v4(),
            SubscriptionStatus::Active,
            None,
        );
        let subscription_id = subscription.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(subscription.clone())));

        let usecase = usecase(
            subscription_repo,
            MockPlanRepository::new(),
            MockAppUserRepository::new(),
        );
        let request = UpdateSubscriptionRequest {
            end_date: Some(Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };

        let err = usecase
            .update_subscription(subscription_id, request)
            .await
            .unwrap_err();
        assert!(matches!(err, UseCaseError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_of_unknown_subscription_is_not_found() {
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_delete_subscription()
            .returning(|_| Ok(false));

        let usecase = usecase(
            subscription_repo,
            MockPlanRepository::new(),
            MockAppUserRepository::new(),
        );

        let err = usecase.delete_subscription(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, UseCaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn my_subscriptions_carry_expiry_projection_and_advisories() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let reference = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_list_by_user_with_plan()
            .with(eq(user_id))
            .returning(move |_| {
                Ok(vec![
                    (
                        sample_subscription(
                            user_id,
                            plan_id,
                            SubscriptionStatus::Active,
                            Some(reference + Duration::days(7)),
                        ),
                        sample_plan(plan_id, 30),
                    ),
                    (
                        sample_subscription(user_id, plan_id, SubscriptionStatus::Pending, None),
                        sample_plan(plan_id, 30),
                    ),
                ])
            });

        let usecase = usecase(
            subscription_repo,
            MockPlanRepository::new(),
            MockAppUserRepository::new(),
        );

        let mine = usecase.my_subscriptions(user_id, reference).await.unwrap();
        let expiry = mine[0].expiry.unwrap();
        assert_eq!(expiry.expiry_status, ExpiryStatus::ExpiringSoon);
        assert_eq!(expiry.days_until_end, 7);
        assert!(mine[1].expiry.is_none());

        let advisories = usecase.my_advisories(user_id, reference).await.unwrap();
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].level, AdvisoryLevel::Warning);
    }
}
