//! Operational errors and their rendering as JSON responses.
//!
//! Every handler that touches the database runs its service call through
//! [`run_service`], so any failure ends up as an [`AppError`] and is rendered
//! by the single [`ResponseError`] implementation below.

use actix_web::error::{BlockingError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError, web};
use serde::Serialize;
use thiserror::Error;

use crate::services::{ServiceError, ServiceResult};

/// Message shown to clients in place of non-operational failures.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went very wrong!";

pub const NOT_FOUND_MESSAGE: &str = "No tour found with that ID";

/// Error carrying the message and status returned to the client.
///
/// Operational errors are expected failures whose message is safe to show.
/// Anything else is logged and rendered with [`GENERIC_ERROR_MESSAGE`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct AppError {
    message: String,
    status_code: StatusCode,
    is_operational: bool,
}

impl AppError {
    pub fn new(message: impl Into<String>, status_code: StatusCode) -> Self {
        Self {
            message: message.into(),
            status_code,
            is_operational: true,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            is_operational: false,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_operational(&self) -> bool {
        self.is_operational
    }

    /// `fail` for client errors, `error` for everything else.
    pub fn status(&self) -> &'static str {
        if self.status_code.is_client_error() {
            "fail"
        } else {
            "error"
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound => AppError::new(NOT_FOUND_MESSAGE, StatusCode::NOT_FOUND),
            ServiceError::Validation(message) => AppError::new(
                format!("Invalid input data. {message}"),
                StatusCode::BAD_REQUEST,
            ),
            ServiceError::InvalidQuery(message) => AppError::new(
                format!("Invalid query parameters. {message}"),
                StatusCode::BAD_REQUEST,
            ),
            ServiceError::Conflict(field) => AppError::new(
                format!("Duplicate field value for {field}. Please use another value!"),
                StatusCode::BAD_REQUEST,
            ),
            ServiceError::Internal(message) => AppError::internal(message),
        }
    }
}

impl From<BlockingError> for AppError {
    fn from(err: BlockingError) -> Self {
        AppError::internal(format!("blocking task failed: {err}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::internal(format!("failed to serialize response: {err}"))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    message: &'a str,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status_code
    }

    fn error_response(&self) -> HttpResponse {
        let message = if self.is_operational {
            self.message.as_str()
        } else {
            log::error!("{}", self.message);
            GENERIC_ERROR_MESSAGE
        };

        HttpResponse::build(self.status_code).json(ErrorBody {
            status: self.status(),
            message,
        })
    }
}

/// Runs a service call on the blocking pool and folds every failure,
/// including a panic inside `f`, into an [`AppError`].
pub async fn run_service<F, T>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    web::block(f).await?.map_err(AppError::from)
}

/// Renders malformed JSON bodies as `fail` envelopes.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::new(format!("Invalid JSON body: {err}"), StatusCode::BAD_REQUEST).into()
}
