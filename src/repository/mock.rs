//! Mock repository implementations for isolating services in tests.

use mockall::mock;

use crate::domain::query::TourQuery;
use crate::domain::tour::{DifficultyStats, MonthlyPlan, NewTour, Tour, UpdateTour};
use crate::domain::types::{TourId, Year};
use crate::repository::errors::RepositoryResult;
use crate::repository::{TourReader, TourWriter};

mock! {
    pub Repository {}

    impl TourReader for Repository {
        fn get_tour_by_id(&self, id: TourId) -> RepositoryResult<Option<Tour>>;
        fn list_tours(&self, query: &TourQuery) -> RepositoryResult<Vec<Tour>>;
        fn tour_stats(&self) -> RepositoryResult<Vec<DifficultyStats>>;
        fn monthly_plan(&self, year: Year) -> RepositoryResult<Vec<MonthlyPlan>>;
    }

    impl TourWriter for Repository {
        fn create_tour(&self, new_tour: &NewTour) -> RepositoryResult<Tour>;
        fn create_tours(&self, new_tours: &[NewTour]) -> RepositoryResult<Vec<Tour>>;
        fn update_tour(&self, id: TourId, updates: &UpdateTour) -> RepositoryResult<Option<Tour>>;
        fn delete_tour(&self, id: TourId) -> RepositoryResult<bool>;
        fn delete_all_tours(&self) -> RepositoryResult<usize>;
    }
}
