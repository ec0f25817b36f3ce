//! Shared helpers for integration tests.
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

use natours::db::{DbPool, establish_connection_pool, run_migrations};
use natours::domain::tour::NewTour;
use natours::domain::types::Difficulty;

/// Migrated SQLite database living in a temporary directory.
pub struct TestDb {
    pool: DbPool,
    _dir: TempDir,
}

impl TestDb {
    pub fn new(name: &str) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join(name);
        let pool = establish_connection_pool(path.to_str().expect("utf-8 path"))
            .expect("create pool");
        run_migrations(&pool).expect("run migrations");
        Self { pool, _dir: dir }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }
}

pub fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

/// Tour with the given name and price, created on `created_at`.
pub fn new_tour(name: &str, price: f64, created_at: NaiveDateTime) -> NewTour {
    NewTour::new(
        name.to_string(),
        5,
        25,
        Difficulty::Easy,
        price,
        "A tour used by the integration tests".to_string(),
        "tour-cover.jpg".to_string(),
        created_at,
    )
}
