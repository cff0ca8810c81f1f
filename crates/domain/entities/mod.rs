pub mod app_users;
pub mod payments;
pub mod plans;
pub mod subscriptions;
