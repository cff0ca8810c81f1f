use diesel::result::{DatabaseErrorKind, Error};

use crate::domain::repositories::ConstraintViolation;

/// Surfaces unique and foreign-key violations as [`ConstraintViolation`].
pub fn map_constraint_violation(err: Error) -> anyhow::Error {
    match err {
        Error::DatabaseError(
            DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation,
            info,
        ) => ConstraintViolation(info.message().to_string()).into(),
        other => other.into(),
    }
}
