use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use crates::domain::{
    entities::{payments::InsertPaymentEntity, plans::PlanEntity},
    repositories::{
        app_users::AppUserRepository, mailer::Mailer, payments::PaymentRepository,
        plans::PlanRepository, subscriptions::SubscriptionRepository,
    },
    value_objects::{
        emails::EmailTemplate,
        enums::payment_statuses::PaymentStatus,
        payments::{PaymentDto, PaymentWithSubscriptionDto, RecordPaymentRequest},
        subscription_lifecycle,
        subscriptions::SubscriptionDto,
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::{MAX_CAS_ATTEMPTS, UseCaseError, UseCaseResult};

pub struct PaymentUseCase<Pay, S, P, U, M>
where
    Pay: PaymentRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    U: AppUserRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    payment_repo: Arc<Pay>,
    subscription_repo: Arc<S>,
    plan_repo: Arc<P>,
    user_repo: Arc<U>,
    mailer: Arc<M>,
}

impl<Pay, S, P, U, M> PaymentUseCase<Pay, S, P, U, M>
where
    Pay: PaymentRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    U: AppUserRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    pub fn new(
        payment_repo: Arc<Pay>,
        subscription_repo: Arc<S>,
        plan_repo: Arc<P>,
        user_repo: Arc<U>,
        mailer: Arc<M>,
    ) -> Self {
        Self {
            payment_repo,
            subscription_repo,
            plan_repo,
            user_repo,
            mailer,
        }
    }

    /// Records a completed payment at the plan's current price and activates
    /// the subscription from now. The confirmation email is best effort.
    pub async fn record_payment(&self, request: RecordPaymentRequest) -> UseCaseResult<PaymentDto> {
        request.validate()?;
        let (Some(subscription_id), Some(payment_method)) =
            (request.subscription_id, request.payment_method)
        else {
            return Err(UseCaseError::Validation(
                "subscriptionId and paymentMethod are required".to_string(),
            ));
        };

        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let subscription = self
                .subscription_repo
                .find_by_id(subscription_id)
                .await
                .map_err(|err| {
                    error!(%subscription_id, db_error = ?err, "payments: failed to load subscription");
                    UseCaseError::Internal(err)
                })?
                .ok_or_else(|| {
                    UseCaseError::NotFound(format!("subscription {subscription_id} not found"))
                })?;

            let plan = self
                .plan_repo
                .find_by_id(subscription.plan_id)
                .await
                .map_err(|err| {
                    error!(%subscription_id, db_error = ?err, "payments: failed to load plan");
                    UseCaseError::Internal(err)
                })?
                .ok_or_else(|| {
                    UseCaseError::NotFound(format!(
                        "plan for subscription {subscription_id} not found"
                    ))
                })?;

            let now = Utc::now();
            let activation = subscription_lifecycle::activate(&subscription, &plan, now)?;
            let payment = InsertPaymentEntity {
                subscription_id,
                amount_minor: plan.price_minor,
                status: PaymentStatus::Completed.to_string(),
                payment_method: payment_method.to_string(),
                paid_at: now,
            };

            let recorded = self
                .payment_repo
                .record_payment_with_activation(payment, activation)
                .await
                .map_err(|err| {
                    error!(%subscription_id, db_error = ?err, "payments: failed to record payment");
                    UseCaseError::Internal(err)
                })?;

            let Some((payment, activated)) = recorded else {
                warn!(%subscription_id, attempt, "payments: subscription changed during payment, retrying");
                continue;
            };

            info!(
                payment_id = %payment.id,
                %subscription_id,
                amount_minor = payment.amount_minor,
                ends_at = ?activated.ends_at,
                "payments: payment recorded and subscription activated"
            );

            self.send_confirmation(activated.user_id, &plan, payment.paid_at.date_naive())
                .await;

            return Ok(PaymentDto::try_from(payment)?);
        }

        error!(%subscription_id, "payments: giving up after repeated concurrent writes");
        Err(UseCaseError::Conflict(format!(
            "subscription {subscription_id} was modified concurrently, try again"
        )))
    }

    pub async fn list_payments(&self) -> UseCaseResult<Vec<PaymentWithSubscriptionDto>> {
        let rows = self
            .payment_repo
            .list_with_subscription()
            .await
            .map_err(|err| {
                error!(db_error = ?err, "payments: failed to list payments");
                UseCaseError::Internal(err)
            })?;

        rows.into_iter()
            .map(|(payment, subscription)| -> UseCaseResult<PaymentWithSubscriptionDto> {
                Ok(PaymentWithSubscriptionDto {
                    payment: PaymentDto::try_from(payment)?,
                    subscription: SubscriptionDto::try_from(subscription)?,
                })
            })
            .collect()
    }

    pub async fn get_payment(&self, payment_id: Uuid) -> UseCaseResult<PaymentWithSubscriptionDto> {
        let (payment, subscription) = self
            .payment_repo
            .find_with_subscription(payment_id)
            .await
            .map_err(|err| {
                error!(%payment_id, db_error = ?err, "payments: failed to load payment");
                UseCaseError::Internal(err)
            })?
            .ok_or_else(|| UseCaseError::NotFound(format!("payment {payment_id} not found")))?;

        Ok(PaymentWithSubscriptionDto {
            payment: PaymentDto::try_from(payment)?,
            subscription: SubscriptionDto::try_from(subscription)?,
        })
    }

    /// Failures are logged and swallowed: the payment is already committed.
    async fn send_confirmation(&self, user_id: Uuid, plan: &PlanEntity, paid_on: NaiveDate) {
        let user = match self.user_repo.find_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!(%user_id, "payments: subscription owner not found, skipping confirmation email");
                return;
            }
            Err(err) => {
                warn!(%user_id, db_error = ?err, "payments: failed to load owner, skipping confirmation email");
                return;
            }
        };

        let template = EmailTemplate::PaymentConfirmation {
            username: user.username,
            plan_name: plan.name.clone(),
            amount_minor: plan.price_minor,
            paid_on,
        };

        if let Err(err) = self.mailer.send(&user.email, &template).await {
            warn!(%user_id, mail_error = ?err, "payments: confirmation email failed");
        }
    }
}
