use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Integer, Text};

use crate::domain::tour::{
    DifficultyStats, MonthlyPlan, NewTour as DomainNewTour, Tour as DomainTour,
    UpdateTour as DomainUpdateTour,
};
use crate::domain::types::{Difficulty, TourId, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::tours)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
/// Diesel model for [`crate::domain::tour::Tour`].
pub struct Tour {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub duration: i32,
    pub max_group_size: i32,
    pub difficulty: String,
    pub ratings_average: f64,
    pub ratings_quantity: i32,
    pub price: f64,
    pub price_discount: Option<f64>,
    pub summary: String,
    pub description: Option<String>,
    pub image_cover: String,
    pub created_at: NaiveDateTime,
    pub version: i32,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations, Insertable)]
#[diesel(table_name = crate::schema::tour_start_dates)]
#[diesel(primary_key(tour_id, position))]
#[diesel(belongs_to(Tour, foreign_key = tour_id))]
pub struct TourStartDate {
    pub tour_id: i32,
    pub position: i32,
    pub start_date: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::tours)]
/// Insertable form of [`Tour`].
pub struct NewTour<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub duration: i32,
    pub max_group_size: i32,
    pub difficulty: &'a str,
    pub ratings_average: f64,
    pub ratings_quantity: i32,
    pub price: f64,
    pub price_discount: Option<f64>,
    pub summary: &'a str,
    pub description: Option<&'a str>,
    pub image_cover: &'a str,
    pub created_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::tours)]
/// Data used when updating a [`Tour`] record. `None` fields are skipped.
pub struct UpdateTour<'a> {
    pub name: Option<&'a str>,
    pub slug: Option<&'a str>,
    pub duration: Option<i32>,
    pub max_group_size: Option<i32>,
    pub difficulty: Option<&'a str>,
    pub ratings_average: Option<f64>,
    pub ratings_quantity: Option<i32>,
    pub price: Option<f64>,
    pub price_discount: Option<f64>,
    pub summary: Option<&'a str>,
    pub description: Option<&'a str>,
    pub image_cover: Option<&'a str>,
}

/// Row produced by the difficulty statistics aggregation.
#[derive(Debug, QueryableByName)]
pub struct DifficultyStatsRow {
    #[diesel(sql_type = Text)]
    pub difficulty: String,
    #[diesel(sql_type = BigInt)]
    pub num_tours: i64,
    #[diesel(sql_type = BigInt)]
    pub num_ratings: i64,
    #[diesel(sql_type = Double)]
    pub avg_rating: f64,
    #[diesel(sql_type = Double)]
    pub avg_price: f64,
    #[diesel(sql_type = Double)]
    pub min_price: f64,
    #[diesel(sql_type = Double)]
    pub max_price: f64,
}

/// Row produced by the monthly plan aggregation.
#[derive(Debug, QueryableByName)]
pub struct MonthlyPlanRow {
    #[diesel(sql_type = Integer)]
    pub month: i32,
    #[diesel(sql_type = BigInt)]
    pub num_tour_starts: i64,
    /// `start_date` [`MonthlyPlanRow::FIELD_SEPARATOR`] `name` entries
    /// joined with [`MonthlyPlanRow::ENTRY_SEPARATOR`], in no particular order.
    #[diesel(sql_type = Text)]
    pub tours: String,
}

impl MonthlyPlanRow {
    /// ASCII record separator, never part of a date or a tour name.
    pub const FIELD_SEPARATOR: char = '\u{1e}';
    /// ASCII unit separator, never part of a date or a tour name.
    pub const ENTRY_SEPARATOR: char = '\u{1f}';

    /// Tour names ordered by start date, then by name.
    fn tour_names(&self) -> Vec<String> {
        let mut starts: Vec<(&str, &str)> = self
            .tours
            .split(Self::ENTRY_SEPARATOR)
            .filter(|entry| !entry.is_empty())
            .map(|entry| entry.split_once(Self::FIELD_SEPARATOR).unwrap_or(("", entry)))
            .collect();
        // Stored timestamps are `YYYY-MM-DD HH:MM:SS` text, so they sort chronologically.
        starts.sort_unstable();
        starts.into_iter().map(|(_, name)| name.to_string()).collect()
    }
}

impl Tour {
    /// Combines the row with its ordered start dates into a domain tour.
    pub fn into_domain(
        self,
        start_dates: Vec<TourStartDate>,
    ) -> Result<DomainTour, TypeConstraintError> {
        Ok(DomainTour {
            id: TourId::new(self.id)?,
            name: self.name,
            slug: self.slug,
            duration: self.duration,
            max_group_size: self.max_group_size,
            difficulty: self.difficulty.parse::<Difficulty>()?,
            ratings_average: self.ratings_average,
            ratings_quantity: self.ratings_quantity,
            price: self.price,
            price_discount: self.price_discount,
            summary: self.summary,
            description: self.description,
            image_cover: self.image_cover,
            created_at: self.created_at,
            start_dates: start_dates.into_iter().map(|row| row.start_date).collect(),
            version: self.version,
        })
    }
}

impl TourStartDate {
    /// Rows for `start_dates`, numbered in the order given.
    pub fn for_tour(tour_id: i32, start_dates: &[NaiveDateTime]) -> Vec<Self> {
        start_dates
            .iter()
            .zip(0..)
            .map(|(start_date, position)| Self {
                tour_id,
                position,
                start_date: *start_date,
            })
            .collect()
    }
}

impl<'a> From<&'a DomainNewTour> for NewTour<'a> {
    fn from(tour: &'a DomainNewTour) -> Self {
        Self {
            name: tour.name.as_str(),
            slug: tour.slug.as_str(),
            duration: tour.duration,
            max_group_size: tour.max_group_size,
            difficulty: tour.difficulty.as_str(),
            ratings_average: tour.ratings_average,
            ratings_quantity: tour.ratings_quantity,
            price: tour.price,
            price_discount: tour.price_discount,
            summary: tour.summary.as_str(),
            description: tour.description.as_deref(),
            image_cover: tour.image_cover.as_str(),
            created_at: tour.created_at,
        }
    }
}

impl<'a> From<&'a DomainUpdateTour> for UpdateTour<'a> {
    fn from(tour: &'a DomainUpdateTour) -> Self {
        Self {
            name: tour.name.as_deref(),
            slug: tour.slug.as_deref(),
            duration: tour.duration,
            max_group_size: tour.max_group_size,
            difficulty: tour.difficulty.map(Difficulty::as_str),
            ratings_average: tour.ratings_average,
            ratings_quantity: tour.ratings_quantity,
            price: tour.price,
            price_discount: tour.price_discount,
            summary: tour.summary.as_deref(),
            description: tour.description.as_deref(),
            image_cover: tour.image_cover.as_deref(),
        }
    }
}

impl From<DifficultyStatsRow> for DifficultyStats {
    fn from(row: DifficultyStatsRow) -> Self {
        Self {
            difficulty: row.difficulty,
            num_tours: row.num_tours,
            num_ratings: row.num_ratings,
            avg_rating: row.avg_rating,
            avg_price: row.avg_price,
            min_price: row.min_price,
            max_price: row.max_price,
        }
    }
}

impl From<MonthlyPlanRow> for MonthlyPlan {
    fn from(row: MonthlyPlanRow) -> Self {
        Self {
            month: u32::try_from(row.month).unwrap_or_default(),
            num_tour_starts: row.num_tour_starts,
            tours: row.tour_names(),
        }
    }
}
