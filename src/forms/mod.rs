//! Request payloads accepted by the tour routes.

use thiserror::Error;
use validator::ValidationErrors;

pub mod tour;

#[derive(Debug, Error)]
/// Errors that can occur when processing a request payload.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("difficulty is either: easy, medium, difficult")]
    InvalidDifficulty,
}
