use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{Difficulty, TourId, slugify};

/// Ratings average assigned to tours that have not been rated yet.
pub const DEFAULT_RATINGS_AVERAGE: f64 = 4.5;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: TourId,
    pub name: String,
    pub slug: String,
    pub duration: i32,
    pub max_group_size: i32,
    pub difficulty: Difficulty,
    pub ratings_average: f64,
    pub ratings_quantity: i32,
    pub price: f64,
    pub price_discount: Option<f64>,
    pub summary: String,
    pub description: Option<String>,
    pub image_cover: String,
    pub created_at: NaiveDateTime,
    pub start_dates: Vec<NaiveDateTime>,
    /// Revision counter bumped on every update.
    pub version: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewTour {
    pub name: String,
    pub slug: String,
    pub duration: i32,
    pub max_group_size: i32,
    pub difficulty: Difficulty,
    pub ratings_average: f64,
    pub ratings_quantity: i32,
    pub price: f64,
    pub price_discount: Option<f64>,
    pub summary: String,
    pub description: Option<String>,
    pub image_cover: String,
    pub created_at: NaiveDateTime,
    pub start_dates: Vec<NaiveDateTime>,
}

impl NewTour {
    /// Builds a tour ready for insertion, trimming text and deriving the slug.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        name: String,
        duration: i32,
        max_group_size: i32,
        difficulty: Difficulty,
        price: f64,
        summary: String,
        image_cover: String,
        created_at: NaiveDateTime,
    ) -> Self {
        let name = name.trim().to_string();
        Self {
            slug: slugify(&name),
            name,
            duration,
            max_group_size,
            difficulty,
            ratings_average: DEFAULT_RATINGS_AVERAGE,
            ratings_quantity: 0,
            price,
            price_discount: None,
            summary: summary.trim().to_string(),
            description: None,
            image_cover,
            created_at,
            start_dates: Vec::new(),
        }
    }

    #[must_use]
    pub fn ratings(mut self, average: f64, quantity: i32) -> Self {
        self.ratings_average = average;
        self.ratings_quantity = quantity;
        self
    }

    #[must_use]
    pub fn price_discount(mut self, discount: Option<f64>) -> Self {
        self.price_discount = discount;
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    #[must_use]
    pub fn start_dates(mut self, start_dates: Vec<NaiveDateTime>) -> Self {
        self.start_dates = start_dates;
        self
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateTour {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub duration: Option<i32>,
    pub max_group_size: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub ratings_average: Option<f64>,
    pub ratings_quantity: Option<i32>,
    pub price: Option<f64>,
    pub price_discount: Option<f64>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub image_cover: Option<String>,
    /// Replaces the whole start date sequence when present.
    pub start_dates: Option<Vec<NaiveDateTime>>,
}

impl UpdateTour {
    /// Sets a new name and keeps the slug in sync with it.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        let name = name.into().trim().to_string();
        self.slug = Some(slugify(&name));
        self.name = Some(name);
        self
    }
}

/// Per-difficulty aggregate of highly rated tours.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyStats {
    /// Upper-cased difficulty the group was built from.
    #[serde(rename = "_id")]
    pub difficulty: String,
    pub num_tours: i64,
    pub num_ratings: i64,
    pub avg_rating: f64,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

/// Number of tour starts in one month of a year.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPlan {
    /// Month number, 1 for January.
    pub month: u32,
    #[serde(rename = "numToursStart")]
    pub num_tour_starts: i64,
    pub tours: Vec<String>,
}
