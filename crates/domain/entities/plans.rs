use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::plans;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = plans)]
pub struct PlanEntity {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price_minor: i32,
    pub duration_days: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = plans)]
pub struct InsertPlanEntity {
    pub name: String,
    pub description: String,
    pub price_minor: i32,
    pub duration_days: i32,
}

#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = plans)]
pub struct UpdatePlanEntity {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_minor: Option<i32>,
    pub duration_days: Option<i32>,
    pub updated_at: DateTime<Utc>,
}
