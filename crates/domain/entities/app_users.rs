use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::app_users;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = app_users)]
pub struct AppUserEntity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = app_users)]
pub struct InsertAppUserEntity {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: String,
}

/// Profile edit; `None` fields are left unchanged.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = app_users)]
pub struct UpdateAppUserEntity {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub updated_at: DateTime<Utc>,
}
