pub mod advisories;
pub mod app_users;
pub mod emails;
pub mod enums;
pub mod payments;
pub mod plans;
pub mod reports;
pub mod subscription_lifecycle;
pub mod subscriptions;
