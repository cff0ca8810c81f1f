pub mod payment_methods;
pub mod payment_statuses;
pub mod subscription_statuses;
pub mod user_roles;
