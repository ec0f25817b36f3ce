//! Business operations behind the HTTP handlers.
//!
//! Every function is synchronous and generic over the repository traits so
//! handlers can run it on the blocking pool and tests can swap in a mock.

use thiserror::Error;

use crate::repository::errors::RepositoryError;

pub mod tours;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found")]
    NotFound,

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Another tour already holds the value of a unique field.
    #[error("duplicate value for {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            RepositoryError::ValidationError(message) => ServiceError::Validation(message),
            RepositoryError::DuplicateValue(column) => ServiceError::Conflict(column),
            RepositoryError::ConstraintViolation(message) => ServiceError::Validation(message),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}
