use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::plans::{InsertPlanEntity, PlanEntity, UpdatePlanEntity};

#[automock]
#[async_trait]
pub trait PlanRepository {
    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>>;
    async fn find_by_name(&self, name: &str) -> Result<Vec<PlanEntity>>;
    async fn list_plans(&self) -> Result<Vec<PlanEntity>>;
    async fn create_plan(&self, plan: InsertPlanEntity) -> Result<PlanEntity>;
    async fn update_plan(&self, plan_id: Uuid, changes: UpdatePlanEntity) -> Result<Option<PlanEntity>>;
    /// Returns `false` when no plan had this id. A plan still referenced by a
    /// subscription fails with [`super::ConstraintViolation`].
    async fn delete_plan(&self, plan_id: Uuid) -> Result<bool>;
    async fn count_subscriptions(&self, plan_id: Uuid) -> Result<i64>;
    async fn count_active_subscriptions(&self, plan_id: Uuid) -> Result<i64>;
}
