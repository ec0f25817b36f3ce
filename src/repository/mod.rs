use crate::{
    db::DbPool,
    domain::{
        query::TourQuery,
        tour::{DifficultyStats, MonthlyPlan, NewTour, Tour, UpdateTour},
        types::{TourId, Year},
    },
    repository::errors::RepositoryResult,
};

pub mod errors;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;
pub mod tour;

/// Ratings average a tour needs to be counted by [`TourReader::tour_stats`].
pub const STATS_MIN_RATING: f64 = 4.5;

/// Difficulty group left out of [`TourReader::tour_stats`].
pub const STATS_EXCLUDED_DIFFICULTY: &str = "EASY";

/// Most month groups returned by [`TourReader::monthly_plan`].
pub const MONTHLY_PLAN_LIMIT: i64 = 12;

/// Diesel-backed repository shared by every handler.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

pub trait TourReader {
    fn get_tour_by_id(&self, id: TourId) -> RepositoryResult<Option<Tour>>;
    /// Runs the filter, sort and pagination directives of `query`.
    fn list_tours(&self, query: &TourQuery) -> RepositoryResult<Vec<Tour>>;
    /// Per-difficulty statistics of tours rated at least [`STATS_MIN_RATING`],
    /// cheapest group first, without the [`STATS_EXCLUDED_DIFFICULTY`] group.
    fn tour_stats(&self) -> RepositoryResult<Vec<DifficultyStats>>;
    /// Tour starts per month of `year`, busiest month first.
    fn monthly_plan(&self, year: Year) -> RepositoryResult<Vec<MonthlyPlan>>;
}

pub trait TourWriter {
    fn create_tour(&self, new_tour: &NewTour) -> RepositoryResult<Tour>;
    /// Inserts every tour in one transaction; nothing is stored if one fails.
    fn create_tours(&self, new_tours: &[NewTour]) -> RepositoryResult<Vec<Tour>>;
    /// Returns `None` when no tour has the given id.
    fn update_tour(&self, id: TourId, updates: &UpdateTour) -> RepositoryResult<Option<Tour>>;
    /// Returns `false` when no tour has the given id.
    fn delete_tour(&self, id: TourId) -> RepositoryResult<bool>;
    /// Removes every tour, returning how many were deleted.
    fn delete_all_tours(&self) -> RepositoryResult<usize>;
}
