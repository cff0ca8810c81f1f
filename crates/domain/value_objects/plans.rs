use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::entities::plans::PlanEntity;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanDto {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price_minor: i32,
    pub duration_days: i32,
}

impl From<PlanEntity> for PlanDto {
    fn from(value: PlanEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            price_minor: value.price_minor,
            duration_days: value.duration_days,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    #[validate(required, length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(required, length(max = 1000))]
    pub description: Option<String>,
    /// Price in cents.
    #[validate(required, range(min = 0))]
    pub price_minor: Option<i32>,
    #[validate(required, range(min = 1))]
    pub duration_days: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub price_minor: Option<i32>,
    #[validate(range(min = 1))]
    pub duration_days: Option<i32>,
}
