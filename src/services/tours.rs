use chrono::Utc;

use crate::domain::query::TourQuery;
use crate::domain::tour::{DifficultyStats, MonthlyPlan, Tour};
use crate::domain::types::{TourId, Year};
use crate::forms::tour::{CreateTourForm, UpdateTourForm};
use crate::repository::{TourReader, TourWriter};
use crate::services::{ServiceError, ServiceResult};

/// Runs the filter, sort and pagination directives of `query`.
pub fn list_tours<R>(repo: &R, query: &TourQuery) -> ServiceResult<Vec<Tour>>
where
    R: TourReader + ?Sized,
{
    repo.list_tours(query).map_err(|err| {
        log::error!("Failed to list tours: {err}");
        ServiceError::from(err)
    })
}

pub fn get_tour<R>(repo: &R, id: TourId) -> ServiceResult<Tour>
where
    R: TourReader + ?Sized,
{
    repo.get_tour_by_id(id)
        .map_err(|err| {
            log::error!("Failed to load tour {id}: {err}");
            ServiceError::from(err)
        })?
        .ok_or(ServiceError::NotFound)
}

/// Validates the payload and stores a new tour created now.
pub fn create_tour<R>(repo: &R, form: CreateTourForm) -> ServiceResult<Tour>
where
    R: TourWriter + ?Sized,
{
    let new_tour = form.into_domain(Utc::now().naive_utc())?;

    let tour = repo.create_tour(&new_tour).map_err(|err| {
        log::error!("Failed to create tour {}: {err}", new_tour.name);
        ServiceError::from(err)
    })?;
    log::info!("Created tour {} ({})", tour.id, tour.name);

    Ok(tour)
}

/// Applies a partial update and returns the stored result.
pub fn update_tour<R>(repo: &R, id: TourId, form: UpdateTourForm) -> ServiceResult<Tour>
where
    R: TourWriter + ?Sized,
{
    let updates = form.into_domain()?;

    let tour = repo
        .update_tour(id, &updates)
        .map_err(|err| {
            log::error!("Failed to update tour {id}: {err}");
            ServiceError::from(err)
        })?
        .ok_or(ServiceError::NotFound)?;
    log::info!("Updated tour {id} to version {}", tour.version);

    Ok(tour)
}

pub fn delete_tour<R>(repo: &R, id: TourId) -> ServiceResult<()>
where
    R: TourWriter + ?Sized,
{
    let deleted = repo.delete_tour(id).map_err(|err| {
        log::error!("Failed to delete tour {id}: {err}");
        ServiceError::from(err)
    })?;

    if !deleted {
        return Err(ServiceError::NotFound);
    }
    log::info!("Deleted tour {id}");
    Ok(())
}

/// Validates every payload first, then stores them all in one transaction.
pub fn import_tours<R>(repo: &R, forms: Vec<CreateTourForm>) -> ServiceResult<Vec<Tour>>
where
    R: TourWriter + ?Sized,
{
    let created_at = Utc::now().naive_utc();
    let new_tours = forms
        .into_iter()
        .map(|form| form.into_domain(created_at))
        .collect::<Result<Vec<_>, _>>()?;

    let tours = repo.create_tours(&new_tours).map_err(|err| {
        log::error!("Failed to import {} tours: {err}", new_tours.len());
        ServiceError::from(err)
    })?;
    log::info!("Imported {} tours", tours.len());

    Ok(tours)
}

pub fn delete_all_tours<R>(repo: &R) -> ServiceResult<usize>
where
    R: TourWriter + ?Sized,
{
    let deleted = repo.delete_all_tours().map_err(|err| {
        log::error!("Failed to delete tours: {err}");
        ServiceError::from(err)
    })?;
    log::info!("Deleted {deleted} tours");
    Ok(deleted)
}

pub fn tour_stats<R>(repo: &R) -> ServiceResult<Vec<DifficultyStats>>
where
    R: TourReader + ?Sized,
{
    repo.tour_stats().map_err(|err| {
        log::error!("Failed to compute tour stats: {err}");
        ServiceError::from(err)
    })
}

/// Tour starts per month of the year given as a path segment.
pub fn monthly_plan<R>(repo: &R, year: &str) -> ServiceResult<Vec<MonthlyPlan>>
where
    R: TourReader + ?Sized,
{
    let year: Year = year.parse()?;

    repo.monthly_plan(year).map_err(|err| {
        log::error!("Failed to compute monthly plan for {year}: {err}");
        ServiceError::from(err)
    })
}
