use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::payments;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payments)]
pub struct PaymentEntity {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub amount_minor: i32,
    pub status: String,
    pub payment_method: String,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = payments)]
pub struct InsertPaymentEntity {
    pub subscription_id: Uuid,
    pub amount_minor: i32,
    pub status: String,
    pub payment_method: String,
    pub paid_at: DateTime<Utc>,
}
