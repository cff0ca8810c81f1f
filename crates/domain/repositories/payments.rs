use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::{
        payments::{InsertPaymentEntity, PaymentEntity},
        subscriptions::SubscriptionEntity,
    },
    value_objects::subscription_lifecycle::SubscriptionPeriodUpdate,
};

#[automock]
#[async_trait]
pub trait PaymentRepository {
    /// Inserts the payment and applies the activation in one transaction.
    ///
    /// Returns `None`, with nothing written, when the activation's version check fails.
    async fn record_payment_with_activation(
        &self,
        payment: InsertPaymentEntity,
        activation: SubscriptionPeriodUpdate,
    ) -> Result<Option<(PaymentEntity, SubscriptionEntity)>>;

    async fn list_with_subscription(&self) -> Result<Vec<(PaymentEntity, SubscriptionEntity)>>;

    async fn find_with_subscription(
        &self,
        payment_id: Uuid,
    ) -> Result<Option<(PaymentEntity, SubscriptionEntity)>>;
}
