use anyhow::{Error, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{
    entities::payments::PaymentEntity,
    value_objects::{
        enums::{payment_methods::PaymentMethod, payment_statuses::PaymentStatus},
        subscriptions::SubscriptionDto,
    },
};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    #[validate(required)]
    pub subscription_id: Option<Uuid>,
    #[validate(required)]
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    pub id: Uuid,
    pub subscription_id: Uuid,
    /// Plan price in cents at the time of payment.
    pub amount_minor: i32,
    pub status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub payment_date: DateTime<Utc>,
}

impl TryFrom<PaymentEntity> for PaymentDto {
    type Error = Error;

    fn try_from(value: PaymentEntity) -> Result<Self, Self::Error> {
        let status = PaymentStatus::from_str(&value.status)
            .ok_or_else(|| anyhow!("payment {} has unknown status {:?}", value.id, value.status))?;
        let payment_method = PaymentMethod::from_str(&value.payment_method).ok_or_else(|| {
            anyhow!(
                "payment {} has unknown method {:?}",
                value.id,
                value.payment_method
            )
        })?;

        Ok(Self {
            id: value.id,
            subscription_id: value.subscription_id,
            amount_minor: value.amount_minor,
            status,
            payment_method,
            payment_date: value.paid_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWithSubscriptionDto {
    #[serde(flatten)]
    pub payment: PaymentDto,
    pub subscription: SubscriptionDto,
}
