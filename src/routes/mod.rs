//! HTTP handlers of the JSON API.

use actix_web::HttpRequest;
use actix_web::http::StatusCode;

use crate::domain::query::TourQuery;
use crate::domain::types::TourId;
use crate::errors::AppError;
use crate::services::ServiceError;

pub mod tours;

/// Decodes the raw query string, keeping repeated keys in order, and
/// translates it into a [`TourQuery`].
pub fn tour_query(req: &HttpRequest) -> Result<TourQuery, AppError> {
    let pairs: Vec<(String, String)> =
        serde_html_form::from_str(req.query_string()).map_err(|err| {
            AppError::new(
                format!("Invalid query string: {err}"),
                StatusCode::BAD_REQUEST,
            )
        })?;

    TourQuery::from_params(pairs).map_err(|err| ServiceError::from(err).into())
}

pub fn tour_id(raw: &str) -> Result<TourId, AppError> {
    raw.parse::<TourId>()
        .map_err(|err| ServiceError::from(err).into())
}
