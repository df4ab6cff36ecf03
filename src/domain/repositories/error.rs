use thiserror::Error;

use crate::domain::value_objects::{EmbeddingError, GroundTruthError};

/// Integrity rule broken by a write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintViolation {
    #[error("foreign key violation: {0}")]
    ForeignKey(String),
    #[error("unique violation: {0}")]
    Unique(String),
    #[error("retrieval relation must reference exactly one of chunk_id or image_chunk_id")]
    ExactlyOneTarget,
    #[error("not-null violation: {0}")]
    NotNull(String),
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Constraint violation: {0}")]
    Constraint(#[from] ConstraintViolation),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Vector search extension unavailable: {0}")]
    ExtensionUnavailable(String),
    #[error("Database error: {0}")]
    Database(String),
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        RepositoryError::NotFound { entity, id }
    }

    pub fn constraint(&self) -> Option<&ConstraintViolation> {
        match self {
            RepositoryError::Constraint(violation) => Some(violation),
            _ => None,
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        self.constraint().is_some()
    }
}

impl From<EmbeddingError> for RepositoryError {
    fn from(error: EmbeddingError) -> Self {
        RepositoryError::Validation(error.to_string())
    }
}

impl From<GroundTruthError> for RepositoryError {
    fn from(error: GroundTruthError) -> Self {
        RepositoryError::Validation(error.to_string())
    }
}
