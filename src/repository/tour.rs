//! Diesel implementation of the tour repository traits.

use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Double, Text};
use diesel::sqlite::{Sqlite, SqliteConnection};

use crate::domain::query::{
    Comparison, FieldFilter, FilterValue, SortDirection, SortKey, TourField, TourQuery,
};
use crate::domain::tour::{DifficultyStats, MonthlyPlan, NewTour, Tour, UpdateTour};
use crate::domain::types::{TourId, Year};
use crate::models::tour::{
    DifficultyStatsRow, MonthlyPlanRow, NewTour as DbNewTour, Tour as DbTour, TourStartDate,
    UpdateTour as DbUpdateTour,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    DieselRepository, MONTHLY_PLAN_LIMIT, STATS_EXCLUDED_DIFFICULTY, STATS_MIN_RATING,
    TourReader, TourWriter,
};
use crate::schema::{tour_start_dates, tours};

type BoxedTourQuery = tours::BoxedQuery<'static, Sqlite>;

const DISCOUNT_ABOVE_PRICE: &str = "Discount price should be below regular price";

const TOUR_STATS_SQL: &str = r#"
SELECT UPPER(difficulty) AS difficulty,
       COUNT(*) AS num_tours,
       COALESCE(SUM(ratings_quantity), 0) AS num_ratings,
       AVG(ratings_average) AS avg_rating,
       AVG(price) AS avg_price,
       MIN(price) AS min_price,
       MAX(price) AS max_price
FROM tours
WHERE ratings_average >= ?
GROUP BY UPPER(difficulty)
HAVING UPPER(difficulty) <> ?
ORDER BY avg_price ASC, difficulty ASC
"#;

// Each start is `start_date char(30) name`, starts are joined with char(31);
// see `MonthlyPlanRow` for the decoding.
const MONTHLY_PLAN_SQL: &str = r#"
SELECT CAST(strftime('%m', starts.start_date) AS INTEGER) AS month,
       COUNT(*) AS num_tour_starts,
       GROUP_CONCAT(starts.start_date || char(30) || starts.name, char(31)) AS tours
FROM (
    SELECT d.start_date AS start_date, t.name AS name
    FROM tour_start_dates d
    INNER JOIN tours t ON t.id = d.tour_id
    WHERE strftime('%Y', d.start_date) = ?
) AS starts
GROUP BY month
ORDER BY num_tour_starts DESC, month ASC
LIMIT ?
"#;

macro_rules! compare {
    ($query:expr, $column:expr, $comparison:expr, $value:expr) => {
        match $comparison {
            Comparison::Eq => $query.filter($column.eq($value)),
            Comparison::Gt => $query.filter($column.gt($value)),
            Comparison::Gte => $query.filter($column.ge($value)),
            Comparison::Lt => $query.filter($column.lt($value)),
            Comparison::Lte => $query.filter($column.le($value)),
        }
    };
}

macro_rules! order {
    ($query:expr, $column:expr, $direction:expr) => {
        match $direction {
            SortDirection::Ascending => $query.then_order_by($column.asc()),
            SortDirection::Descending => $query.then_order_by($column.desc()),
        }
    };
}

fn apply_filter(query: BoxedTourQuery, filter: &FieldFilter) -> RepositoryResult<BoxedTourQuery> {
    let op = filter.comparison;
    let query = match (filter.field, &filter.value) {
        (TourField::Id, FilterValue::Integer(v)) => compare!(query, tours::id, op, *v),
        (TourField::Duration, FilterValue::Integer(v)) => compare!(query, tours::duration, op, *v),
        (TourField::MaxGroupSize, FilterValue::Integer(v)) => {
            compare!(query, tours::max_group_size, op, *v)
        }
        (TourField::RatingsQuantity, FilterValue::Integer(v)) => {
            compare!(query, tours::ratings_quantity, op, *v)
        }
        (TourField::Version, FilterValue::Integer(v)) => compare!(query, tours::version, op, *v),
        (TourField::RatingsAverage, FilterValue::Number(v)) => {
            compare!(query, tours::ratings_average, op, *v)
        }
        (TourField::Price, FilterValue::Number(v)) => compare!(query, tours::price, op, *v),
        (TourField::PriceDiscount, FilterValue::Number(v)) => {
            compare!(query, tours::price_discount, op, *v)
        }
        (TourField::Name, FilterValue::Text(v)) => compare!(query, tours::name, op, v.clone()),
        (TourField::Slug, FilterValue::Text(v)) => compare!(query, tours::slug, op, v.clone()),
        (TourField::Difficulty, FilterValue::Text(v)) => {
            compare!(query, tours::difficulty, op, v.trim().to_lowercase())
        }
        (TourField::Summary, FilterValue::Text(v)) => {
            compare!(query, tours::summary, op, v.clone())
        }
        (TourField::Description, FilterValue::Text(v)) => {
            compare!(query, tours::description, op, v.clone())
        }
        (TourField::ImageCover, FilterValue::Text(v)) => {
            compare!(query, tours::image_cover, op, v.clone())
        }
        (TourField::CreatedAt, FilterValue::Timestamp(v)) => {
            compare!(query, tours::created_at, op, *v)
        }
        (field, value) => {
            return Err(RepositoryError::ValidationError(format!(
                "cannot filter {} by {value:?}",
                field.key()
            )));
        }
    };
    Ok(query)
}

fn apply_sort(query: BoxedTourQuery, key: SortKey) -> RepositoryResult<BoxedTourQuery> {
    let direction = key.direction;
    let query = match key.field {
        TourField::Id => order!(query, tours::id, direction),
        TourField::Name => order!(query, tours::name, direction),
        TourField::Slug => order!(query, tours::slug, direction),
        TourField::Duration => order!(query, tours::duration, direction),
        TourField::MaxGroupSize => order!(query, tours::max_group_size, direction),
        TourField::Difficulty => order!(query, tours::difficulty, direction),
        TourField::RatingsAverage => order!(query, tours::ratings_average, direction),
        TourField::RatingsQuantity => order!(query, tours::ratings_quantity, direction),
        TourField::Price => order!(query, tours::price, direction),
        TourField::PriceDiscount => order!(query, tours::price_discount, direction),
        TourField::Summary => order!(query, tours::summary, direction),
        TourField::Description => order!(query, tours::description, direction),
        TourField::ImageCover => order!(query, tours::image_cover, direction),
        TourField::CreatedAt => order!(query, tours::created_at, direction),
        TourField::Version => order!(query, tours::version, direction),
        TourField::StartDates => {
            return Err(RepositoryError::ValidationError(
                "cannot sort by startDates".to_string(),
            ));
        }
    };
    Ok(query)
}

/// Loads the start dates of `rows` and assembles domain tours in row order.
fn attach_start_dates(
    conn: &mut SqliteConnection,
    rows: Vec<DbTour>,
) -> RepositoryResult<Vec<Tour>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let start_dates = TourStartDate::belonging_to(&rows)
        .select(TourStartDate::as_select())
        .order((
            tour_start_dates::tour_id.asc(),
            tour_start_dates::position.asc(),
        ))
        .load::<TourStartDate>(conn)?
        .grouped_by(&rows);

    rows.into_iter()
        .zip(start_dates)
        .map(|(row, dates)| row.into_domain(dates).map_err(RepositoryError::from))
        .collect()
}

fn insert_start_dates(
    conn: &mut SqliteConnection,
    tour_id: i32,
    start_dates: &[chrono::NaiveDateTime],
) -> RepositoryResult<Vec<TourStartDate>> {
    let rows = TourStartDate::for_tour(tour_id, start_dates);
    if !rows.is_empty() {
        diesel::insert_into(tour_start_dates::table)
            .values(&rows)
            .execute(conn)?;
    }
    Ok(rows)
}

fn insert_tour(conn: &mut SqliteConnection, new_tour: &NewTour) -> RepositoryResult<Tour> {
    let insertable: DbNewTour = new_tour.into();
    let row = diesel::insert_into(tours::table)
        .values(&insertable)
        .get_result::<DbTour>(conn)?;
    let start_dates = insert_start_dates(conn, row.id, &new_tour.start_dates)?;

    Ok(row.into_domain(start_dates)?)
}

impl TourReader for DieselRepository {
    fn get_tour_by_id(&self, id: TourId) -> RepositoryResult<Option<Tour>> {
        let mut conn = self.pool().get()?;
        let row = tours::table
            .find(id.get())
            .first::<DbTour>(&mut conn)
            .optional()?;

        match row {
            Some(row) => Ok(attach_start_dates(&mut conn, vec![row])?.pop()),
            None => Ok(None),
        }
    }

    fn list_tours(&self, query: &TourQuery) -> RepositoryResult<Vec<Tour>> {
        let mut conn = self.pool().get()?;

        let mut items: BoxedTourQuery = tours::table.into_boxed();
        for filter in &query.filters {
            items = apply_filter(items, filter)?;
        }
        for key in query.sort_keys() {
            items = apply_sort(items, key)?;
        }
        // Ties on the requested keys keep a stable order across pages.
        items = items.then_order_by(tours::id.asc());

        let limit = i64::try_from(query.pagination.per_page).unwrap_or(i64::MAX);
        let offset = i64::try_from(query.pagination.offset()).unwrap_or(i64::MAX);

        let rows = items
            .limit(limit)
            .offset(offset)
            .load::<DbTour>(&mut conn)?;

        attach_start_dates(&mut conn, rows)
    }

    fn tour_stats(&self) -> RepositoryResult<Vec<DifficultyStats>> {
        let mut conn = self.pool().get()?;
        let rows = sql_query(TOUR_STATS_SQL)
            .bind::<Double, _>(STATS_MIN_RATING)
            .bind::<Text, _>(STATS_EXCLUDED_DIFFICULTY)
            .load::<DifficultyStatsRow>(&mut conn)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn monthly_plan(&self, year: Year) -> RepositoryResult<Vec<MonthlyPlan>> {
        let mut conn = self.pool().get()?;
        let rows = sql_query(MONTHLY_PLAN_SQL)
            .bind::<Text, _>(year.to_string())
            .bind::<BigInt, _>(MONTHLY_PLAN_LIMIT)
            .load::<MonthlyPlanRow>(&mut conn)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

impl TourWriter for DieselRepository {
    fn create_tour(&self, new_tour: &NewTour) -> RepositoryResult<Tour> {
        let mut conn = self.pool().get()?;

        conn.transaction::<_, RepositoryError, _>(|conn| insert_tour(conn, new_tour))
    }

    fn create_tours(&self, new_tours: &[NewTour]) -> RepositoryResult<Vec<Tour>> {
        let mut conn = self.pool().get()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            new_tours
                .iter()
                .map(|new_tour| insert_tour(conn, new_tour))
                .collect()
        })
    }

    fn update_tour(&self, id: TourId, updates: &UpdateTour) -> RepositoryResult<Option<Tour>> {
        let mut conn = self.pool().get()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let changes: DbUpdateTour = updates.into();
            let row = diesel::update(tours::table.find(id.get()))
                .set((&changes, tours::version.eq(tours::version + 1)))
                .get_result::<DbTour>(conn)
                .optional()?;

            let Some(row) = row else {
                return Ok(None);
            };
            // Either side of the pair may come from the stored row.
            if row.price_discount.is_some_and(|discount| discount >= row.price) {
                return Err(RepositoryError::ValidationError(
                    DISCOUNT_ABOVE_PRICE.to_string(),
                ));
            }

            if let Some(start_dates) = &updates.start_dates {
                diesel::delete(
                    tour_start_dates::table.filter(tour_start_dates::tour_id.eq(row.id)),
                )
                .execute(conn)?;
                insert_start_dates(conn, row.id, start_dates)?;
            }

            Ok(attach_start_dates(conn, vec![row])?.pop())
        })
    }

    fn delete_tour(&self, id: TourId) -> RepositoryResult<bool> {
        let mut conn = self.pool().get()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            diesel::delete(tour_start_dates::table.filter(tour_start_dates::tour_id.eq(id.get())))
                .execute(conn)?;
            let deleted = diesel::delete(tours::table.find(id.get())).execute(conn)?;
            Ok(deleted > 0)
        })
    }

    fn delete_all_tours(&self) -> RepositoryResult<usize> {
        let mut conn = self.pool().get()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            diesel::delete(tour_start_dates::table).execute(conn)?;
            Ok(diesel::delete(tours::table).execute(conn)?)
        })
    }
}
