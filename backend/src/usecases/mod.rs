pub mod payments;
pub mod plans;
pub mod reports;
pub mod subscriptions;
pub mod users;

use axum::http::StatusCode;
use crates::domain::repositories::ConstraintViolation;
use thiserror::Error;
use validator::ValidationErrors;

/// Lifecycle writes retry this many times after losing a version check.
pub const MAX_CAS_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum UseCaseError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl UseCaseError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UseCaseError::NotFound(_) => StatusCode::NOT_FOUND,
            UseCaseError::Forbidden(_) => StatusCode::FORBIDDEN,
            UseCaseError::Validation(_) => StatusCode::BAD_REQUEST,
            UseCaseError::Conflict(_) => StatusCode::CONFLICT,
            UseCaseError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for UseCaseError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_keys().map(|f| f.to_string()).collect();
        fields.sort();
        UseCaseError::Validation(format!("invalid fields: {}", fields.join(", ")))
    }
}

pub type UseCaseResult<T> = std::result::Result<T, UseCaseError>;

/// A write rejected by a store constraint is a `Conflict`; anything else is internal.
pub(crate) fn conflict_or_internal(
    err: anyhow::Error,
    conflict: impl FnOnce() -> String,
) -> UseCaseError {
    if err.downcast_ref::<ConstraintViolation>().is_some() {
        UseCaseError::Conflict(conflict())
    } else {
        UseCaseError::Internal(err)
    }
}
