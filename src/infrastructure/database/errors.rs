use diesel::result::{DatabaseErrorKind, Error as DieselError};

use super::DatabaseError;
use crate::domain::repositories::{ConstraintViolation, RepositoryError};

/// Name of the CHECK constraint guarding the two target columns of `retrieval_relation`.
pub const ONE_TARGET_CONSTRAINT: &str = "retrieval_relation_one_target";

impl From<DieselError> for RepositoryError {
    fn from(error: DieselError) -> Self {
        match error {
            DieselError::DatabaseError(kind, info) => {
                let message = match info.details() {
                    Some(details) => format!("{} ({})", info.message(), details),
                    None => info.message().to_string(),
                };
                match kind {
                    DatabaseErrorKind::ForeignKeyViolation => {
                        ConstraintViolation::ForeignKey(message).into()
                    }
                    DatabaseErrorKind::UniqueViolation => {
                        ConstraintViolation::Unique(message).into()
                    }
                    DatabaseErrorKind::CheckViolation
                        if info.constraint_name() == Some(ONE_TARGET_CONSTRAINT) =>
                    {
                        ConstraintViolation::ExactlyOneTarget.into()
                    }
                    DatabaseErrorKind::NotNullViolation => {
                        let column = info.column_name().unwrap_or("unknown column");
                        ConstraintViolation::NotNull(column.to_string()).into()
                    }
                    _ => RepositoryError::Database(message),
                }
            }
            other => RepositoryError::Database(other.to_string()),
        }
    }
}

impl From<DatabaseError> for RepositoryError {
    fn from(error: DatabaseError) -> Self {
        RepositoryError::Database(error.to_string())
    }
}
