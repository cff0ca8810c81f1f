use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::{
        postgres::{
            postgres_connection::PgPoolSquad,
            schema::{payments, subscriptions},
        },
        repositories::subscriptions::apply_period_update_on,
    },
};
use domain::{
    entities::{
        payments::{InsertPaymentEntity, PaymentEntity},
        subscriptions::SubscriptionEntity,
    },
    repositories::payments::PaymentRepository,
    value_objects::subscription_lifecycle::SubscriptionPeriodUpdate,
};

pub struct PaymentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentRepository for PaymentPostgres {
    async fn record_payment_with_activation(
        &self,
        payment: InsertPaymentEntity,
        activation: SubscriptionPeriodUpdate,
    ) -> Result<Option<(PaymentEntity, SubscriptionEntity)>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let recorded = conn.transaction::<Option<(PaymentEntity, SubscriptionEntity)>, diesel::result::Error, _>(
            |conn| {
                // Activation first: a lost version check must not leave a payment behind.
                let Some(subscription) = apply_period_update_on(conn, &activation)? else {
                    return Ok(None);
                };

                let payment = insert_into(payments::table)
                    .values(&payment)
                    .returning(PaymentEntity::as_returning())
                    .get_result::<PaymentEntity>(conn)?;

                Ok(Some((payment, subscription)))
            },
        )?;

        Ok(recorded)
    }

    async fn list_with_subscription(&self) -> Result<Vec<(PaymentEntity, SubscriptionEntity)>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = payments::table
            .inner_join(subscriptions::table)
            .order(payments::paid_at.desc())
            .select((PaymentEntity::as_select(), SubscriptionEntity::as_select()))
            .load::<(PaymentEntity, SubscriptionEntity)>(&mut conn)?;

        Ok(results)
    }

    async fn find_with_subscription(
        &self,
        payment_id: Uuid,
    ) -> Result<Option<(PaymentEntity, SubscriptionEntity)>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = payments::table
            .inner_join(subscriptions::table)
            .filter(payments::id.eq(payment_id))
            .select((PaymentEntity::as_select(), SubscriptionEntity::as_select()))
            .first::<(PaymentEntity, SubscriptionEntity)>(&mut conn)
            .optional()?;

        Ok(result)
    }
}
