pub mod app_users;
pub mod mailer;
pub mod payments;
pub mod plans;
pub mod reports;
pub mod subscriptions;

/// A write the store rejected on a uniqueness or reference constraint.
///
/// Repositories return it inside `anyhow::Error`; callers find it with `downcast_ref`.
#[derive(Debug, thiserror::Error)]
#[error("constraint violated: {0}")]
pub struct ConstraintViolation(pub String);
