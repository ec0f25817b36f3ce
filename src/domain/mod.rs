//! Domain aggregates exposed by the tours service layer.

pub mod query;
pub mod tour;
pub mod types;
