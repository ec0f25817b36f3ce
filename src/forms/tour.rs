//! JSON payloads for creating and updating tours.

use chrono::NaiveDateTime;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::domain::tour::{DEFAULT_RATINGS_AVERAGE, NewTour, UpdateTour};
use crate::domain::types::{Difficulty, deserialize_timestamps};
use crate::forms::FormError;

fn default_ratings_average() -> f64 {
    DEFAULT_RATINGS_AVERAGE
}

fn discount_below_price(price: f64, discount: f64) -> Result<(), ValidationError> {
    if discount < price {
        Ok(())
    } else {
        let mut error = ValidationError::new("price_discount");
        error.message = Some("Discount price should be below regular price".into());
        Err(error)
    }
}

fn validate_create_discount(form: &CreateTourForm) -> Result<(), ValidationError> {
    match form.price_discount {
        Some(discount) => discount_below_price(form.price, discount),
        None => Ok(()),
    }
}

fn validate_update_discount(form: &UpdateTourForm) -> Result<(), ValidationError> {
    match (form.price, form.price_discount) {
        (Some(price), Some(discount)) => discount_below_price(price, discount),
        _ => Ok(()),
    }
}

fn parse_difficulty(raw: &str) -> Result<Difficulty, FormError> {
    raw.parse().map_err(|_| FormError::InvalidDifficulty)
}

/// Body of `POST /tours`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_create_discount"))]
pub struct CreateTourForm {
    #[validate(length(min = 10, max = 40))]
    pub name: String,
    #[validate(range(min = 1))]
    pub duration: i32,
    #[validate(range(min = 1))]
    pub max_group_size: i32,
    pub difficulty: String,
    #[serde(default = "default_ratings_average")]
    #[validate(range(min = 1.0, max = 5.0))]
    pub ratings_average: f64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub ratings_quantity: i32,
    #[validate(range(exclusive_min = 0.0))]
    pub price: f64,
    #[serde(default)]
    pub price_discount: Option<f64>,
    #[validate(length(min = 1))]
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub image_cover: String,
    #[serde(default, deserialize_with = "deserialize_timestamps")]
    pub start_dates: Vec<NaiveDateTime>,
}

impl CreateTourForm {
    /// Validates the payload and builds a tour stamped with `created_at`.
    pub fn into_domain(self, created_at: NaiveDateTime) -> Result<NewTour, FormError> {
        self.validate()?;
        let difficulty = parse_difficulty(&self.difficulty)?;

        Ok(NewTour::new(
            self.name,
            self.duration,
            self.max_group_size,
            difficulty,
            self.price,
            self.summary,
            self.image_cover,
            created_at,
        )
        .ratings(self.ratings_average, self.ratings_quantity)
        .price_discount(self.price_discount)
        .description(self.description)
        .start_dates(self.start_dates))
    }
}

fn deserialize_optional_timestamps<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<NaiveDateTime>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_timestamps(deserializer).map(Some)
}

/// Body of `PATCH /tours/{id}`; absent keys are left untouched.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_update_discount"))]
pub struct UpdateTourForm {
    #[validate(length(min = 10, max = 40))]
    pub name: Option<String>,
    #[validate(range(min = 1))]
    pub duration: Option<i32>,
    #[validate(range(min = 1))]
    pub max_group_size: Option<i32>,
    pub difficulty: Option<String>,
    #[validate(range(min = 1.0, max = 5.0))]
    pub ratings_average: Option<f64>,
    #[validate(range(min = 0))]
    pub ratings_quantity: Option<i32>,
    #[validate(range(exclusive_min = 0.0))]
    pub price: Option<f64>,
    pub price_discount: Option<f64>,
    #[validate(length(min = 1))]
    pub summary: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub image_cover: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamps")]
    pub start_dates: Option<Vec<NaiveDateTime>>,
}

impl UpdateTourForm {
    pub fn into_domain(self) -> Result<UpdateTour, FormError> {
        self.validate()?;
        let difficulty = self
            .difficulty
            .as_deref()
            .map(parse_difficulty)
            .transpose()?;

        let mut update = UpdateTour {
            duration: self.duration,
            max_group_size: self.max_group_size,
            difficulty,
            ratings_average: self.ratings_average,
            ratings_quantity: self.ratings_quantity,
            price: self.price,
            price_discount: self.price_discount,
            summary: self.summary.map(|s| s.trim().to_string()),
            description: self.description.map(|s| s.trim().to_string()),
            image_cover: self.image_cover,
            start_dates: self.start_dates,
            ..UpdateTour::default()
        };
        if let Some(name) = self.name {
            update = update.name(name);
        }
        Ok(update)
    }
}
