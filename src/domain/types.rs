//! Strongly-typed value objects used by domain entities.
//!
//! These wrappers enforce basic invariants (positive identifiers, known
//! difficulty levels, sane calendar years) so that once a value reaches the
//! domain layer it can be treated as trusted.
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors produced when attempting to construct a constrained value object.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// Provided identifier is zero or negative.
    #[error("id must be greater than zero")]
    NonPositiveId,
    /// Provided identifier is not an integer.
    #[error("invalid id: {0}")]
    InvalidId(String),
    /// Provided difficulty is not one of the supported levels.
    #[error("difficulty is either: easy, medium, difficult (got {0:?})")]
    InvalidDifficulty(String),
    /// Provided year is not an integer within the supported calendar range.
    #[error("year must be an integer between {min} and {max} (got {value:?})")]
    InvalidYear {
        value: String,
        min: i32,
        max: i32,
    },
}

/// Unique identifier for a tour.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TourId(i32);

impl TourId {
    /// Creates a new identifier ensuring it is greater than zero.
    pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(TypeConstraintError::NonPositiveId)
        }
    }

    /// Returns the raw `i32` backing this identifier.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl Display for TourId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TourId {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i32>()
            .map_err(|_| TypeConstraintError::InvalidId(s.to_string()))?;
        Self::new(value)
    }
}

impl TryFrom<i32> for TourId {
    type Error = TypeConstraintError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TourId> for i32 {
    fn from(value: TourId) -> Self {
        value.0
    }
}

/// Difficulty level of a tour.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Difficult,
}

impl Difficulty {
    /// Lower-case representation persisted in the database.
    pub const fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Difficult => "difficult",
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "difficult" => Ok(Difficulty::Difficult),
            _ => Err(TypeConstraintError::InvalidDifficulty(s.to_string())),
        }
    }
}

/// Calendar year accepted by the monthly plan report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Year(i32);

impl Year {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 9999;

    pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(TypeConstraintError::InvalidYear {
                value: value.to_string(),
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    pub const fn get(self) -> i32 {
        self.0
    }
}

impl Display for Year {
    /// Four-digit zero-padded form, matching SQLite's `strftime('%Y', ..)`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

impl FromStr for Year {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<i32>().map_err(|_| TypeConstraintError::InvalidYear {
            value: s.to_string(),
            min: Self::MIN,
            max: Self::MAX,
        })?;
        Self::new(value)
    }
}

/// Builds a URL-friendly slug: lower-cased alphanumeric words joined by `-`.
pub fn slugify(value: &str) -> String {
    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Parses the timestamp notations accepted from clients: RFC 3339,
/// `2021-04-25T10:00:00`, `2021-04-25 10:00:00`, `2021-04-25,10:00` and a
/// bare date (midnight). Offsets are normalized to UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d,%H:%M"];

    let raw = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.naive_utc());
    }
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Serde helper deserializing a list of timestamps with [`parse_timestamp`].
pub fn deserialize_timestamps<'de, D>(deserializer: D) -> Result<Vec<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    raw.iter()
        .map(|value| {
            parse_timestamp(value)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {value}")))
        })
        .collect()
}
