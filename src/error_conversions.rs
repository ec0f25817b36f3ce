//! Error conversion glue between layers.
//!
//! The domain layer must not depend on service/repository error types, so the
//! conversions out of its error types live here.

use crate::domain::query::QueryError;
use crate::domain::types::TypeConstraintError;
use crate::forms::FormError;
use crate::repository::errors::RepositoryError;
use crate::services::ServiceError;

impl From<TypeConstraintError> for ServiceError {
    fn from(val: TypeConstraintError) -> Self {
        ServiceError::Validation(val.to_string())
    }
}

impl From<FormError> for ServiceError {
    fn from(val: FormError) -> Self {
        ServiceError::Validation(val.to_string())
    }
}

impl From<QueryError> for ServiceError {
    fn from(val: QueryError) -> Self {
        ServiceError::InvalidQuery(val.to_string())
    }
}

impl From<TypeConstraintError> for RepositoryError {
    fn from(val: TypeConstraintError) -> Self {
        RepositoryError::ValidationError(val.to_string())
    }
}
