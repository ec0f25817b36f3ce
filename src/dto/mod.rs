//! Response bodies of the JSON API.

pub mod tours;

use serde::Serialize;

/// Value of `status` in every successful response.
pub const STATUS_SUCCESS: &str = "success";

/// Uniform success envelope: `{status, results?, data}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    /// Number of items for collection responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: STATUS_SUCCESS,
            results: None,
            data,
        }
    }

    pub fn collection(results: usize, data: T) -> Self {
        Self {
            status: STATUS_SUCCESS,
            results: Some(results),
            data,
        }
    }
}
