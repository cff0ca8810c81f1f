use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{
    entities::app_users::AppUserEntity, value_objects::enums::user_roles::UserRole,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
}

impl From<AppUserEntity> for UserDto {
    fn from(value: AppUserEntity) -> Self {
        Self {
            id: value.id,
            username: value.username,
            email: value.email,
            address: value.address,
            phone: value.phone,
            role: UserRole::from_str(&value.role),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    #[validate(required, length(min = 3, max = 50))]
    pub username: Option<String>,
    #[validate(required, email)]
    pub email: Option<String>,
    #[validate(required, length(min = 8, max = 128))]
    pub password: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
}

/// Profile edit. Absent fields stay as they are.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
}
