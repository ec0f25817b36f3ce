//! Database models shared across the tours repository.

pub mod config;
pub mod tour;
