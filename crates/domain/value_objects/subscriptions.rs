use anyhow::{Error, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{
    entities::subscriptions::SubscriptionEntity,
    value_objects::{
        enums::subscription_statuses::SubscriptionStatus,
        plans::PlanDto,
        subscription_lifecycle::{ExpiryStatus, days_until_end},
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionEntity> for SubscriptionDto {
    type Error = Error;

    fn try_from(value: SubscriptionEntity) -> Result<Self, Self::Error> {
        let status = SubscriptionStatus::from_str(&value.status).ok_or_else(|| {
            anyhow!(
                "subscription {} has unknown status {:?}",
                value.id,
                value.status
            )
        })?;

        Ok(Self {
            id: value.id,
            user_id: value.user_id,
            plan_id: value.plan_id,
            start_date: value.starts_at,
            end_date: value.ends_at,
            status,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

/// Read-time expiry projection attached to a member's subscription.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryProjection {
    pub expiry_status: ExpiryStatus,
    pub days_until_end: i64,
}

impl ExpiryProjection {
    pub fn at(ends_at: DateTime<Utc>, reference: DateTime<Utc>) -> Self {
        let days = days_until_end(ends_at, reference);
        Self {
            expiry_status: ExpiryStatus::from_days_until_end(days),
            days_until_end: days,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MySubscriptionDto {
    #[serde(flatten)]
    pub subscription: SubscriptionDto,
    pub plan: PlanDto,
    pub expiry: Option<ExpiryProjection>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    #[validate(required)]
    pub user_id: Option<Uuid>,
    #[validate(required)]
    pub plan_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<SubscriptionStatus>,
}

/// Admin edit. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionRequest {
    pub user_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<SubscriptionStatus>,
}
