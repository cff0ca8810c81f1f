pub mod payments;
pub mod plans;
pub mod reports;
pub mod subscriptions;
pub mod users;
