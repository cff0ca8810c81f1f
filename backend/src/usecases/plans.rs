use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    entities::plans::{InsertPlanEntity, UpdatePlanEntity},
    repositories::plans::PlanRepository,
    value_objects::plans::{CreatePlanRequest, PlanDto, UpdatePlanRequest},
};
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::{UseCaseError, UseCaseResult, conflict_or_internal};

pub struct PlanUseCase<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
}

impl<P> PlanUseCase<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>) -> Self {
        Self { plan_repo }
    }

    pub async fn list_plans(&self) -> UseCaseResult<Vec<PlanDto>> {
        let plans = self.plan_repo.list_plans().await.map_err(|err| {
            error!(db_error = ?err, "plans: failed to list plans");
            UseCaseError::Internal(err)
        })?;

        Ok(plans.into_iter().map(PlanDto::from).collect())
    }

    pub async fn get_plan(&self, plan_id: Uuid) -> UseCaseResult<PlanDto> {
        let plan = self
            .plan_repo
            .find_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "plans: failed to load plan");
                UseCaseError::Internal(err)
            })?
            .ok_or_else(|| UseCaseError::NotFound(format!("plan {plan_id} not found")))?;

        Ok(plan.into())
    }

    /// Every plan with exactly this name; empty when none match.
    pub async fn find_by_name(&self, name: &str) -> UseCaseResult<Vec<PlanDto>> {
        let plans = self.plan_repo.find_by_name(name).await.map_err(|err| {
            error!(name, db_error = ?err, "plans: failed to search plans by name");
            UseCaseError::Internal(err)
        })?;

        Ok(plans.into_iter().map(PlanDto::from).collect())
    }

    pub async fn create_plan(&self, request: CreatePlanRequest) -> UseCaseResult<PlanDto> {
        request.validate()?;

        let (Some(name), Some(description), Some(price_minor), Some(duration_days)) = (
            request.name,
            request.description,
            request.price_minor,
            request.duration_days,
        ) else {
            return Err(UseCaseError::Validation(
                "name, description, priceMinor and durationDays are required".to_string(),
            ));
        };

        let plan = self
            .plan_repo
            .create_plan(InsertPlanEntity {
                name,
                description,
                price_minor,
                duration_days,
            })
            .await
            .map_err(|err| {
                error!(db_error = ?err, "plans: failed to create plan");
                UseCaseError::Internal(err)
            })?;

        info!(plan_id = %plan.id, name = %plan.name, "plans: plan created");
        Ok(plan.into())
    }

    /// Price and duration are frozen while an active subscription uses the plan.
    pub async fn update_plan(
        &self,
        plan_id: Uuid,
        request: UpdatePlanRequest,
    ) -> UseCaseResult<PlanDto> {
        request.validate()?;

        let current = self
            .plan_repo
            .find_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "plans: failed to load plan");
                UseCaseError::Internal(err)
            })?
            .ok_or_else(|| UseCaseError::NotFound(format!("plan {plan_id} not found")))?;

        let terms_change = request
            .price_minor
            .is_some_and(|price| price != current.price_minor)
            || request
                .duration_days
                .is_some_and(|days| days != current.duration_days);

        if terms_change {
            let active = self
                .plan_repo
                .count_active_subscriptions(plan_id)
                .await
                .map_err(|err| {
                    error!(%plan_id, db_error = ?err, "plans: failed to count active subscriptions");
                    UseCaseError::Internal(err)
                })?;

            if active > 0 {
                warn!(%plan_id, active, "plans: refusing to reprice a plan in use");
                return Err(UseCaseError::Conflict(format!(
                    "plan {plan_id} has {active} active subscription(s); price and duration cannot change"
                )));
            }
        }

        let changes = UpdatePlanEntity {
            name: request.name,
            description: request.description,
            price_minor: request.price_minor,
            duration_days: request.duration_days,
            updated_at: Utc::now(),
        };

        let plan = self
            .plan_repo
            .update_plan(plan_id, changes)
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "plans: failed to update plan");
                UseCaseError::Internal(err)
            })?
            .ok_or_else(|| UseCaseError::NotFound(format!("plan {plan_id} not found")))?;

        info!(%plan_id, "plans: plan updated");
        Ok(plan.into())
    }

    /// Plans still referenced by a subscription are kept; the caller gets `Conflict`.
    pub async fn delete_plan(&self, plan_id: Uuid) -> UseCaseResult<()> {
        let references = self
            .plan_repo
            .count_subscriptions(plan_id)
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "plans: failed to count plan references");
                UseCaseError::Internal(err)
            })?;

        if references > 0 {
            warn!(%plan_id, references, "plans: refusing to delete a referenced plan");
            return Err(UseCaseError::Conflict(format!(
                "plan {plan_id} is referenced by {references} subscription(s)"
            )));
        }

        let deleted = self.plan_repo.delete_plan(plan_id).await.map_err(|err| {
            error!(%plan_id, db_error = ?err, "plans: failed to delete plan");
            conflict_or_internal(err, || {
                format!("plan {plan_id} is referenced by a subscription")
            })
        })?;

        if !deleted {
            return Err(UseCaseError::NotFound(format!("plan {plan_id} not found")));
        }

        info!(%plan_id, "plans: plan deleted");
        Ok(())
    }
}
