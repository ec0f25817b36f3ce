use natours::domain::query::{Comparison, FilterValue, SortKey, TourField, TourQuery};
use natours::domain::tour::UpdateTour;
use natours::domain::types::{Difficulty, TourId, Year};
use natours::forms::tour::CreateTourForm;
use natours::repository::errors::RepositoryError;
use natours::repository::{DieselRepository, TourReader, TourWriter};
use natours::services::ServiceError;
use natours::services::tours as tours_service;
use serde_json::json;

mod common;

use common::{at, new_tour};

#[test]
fn test_tour_repository_crud() {
    let test_db = common::TestDb::new("test_tour_repository_crud.db");
    let repo = DieselRepository::new(test_db.pool());

    let created = repo
        .create_tour(
            &new_tour("The Forest Hiker", 397.0, at(2024, 1, 1))
                .start_dates(vec![at(2021, 4, 25), at(2021, 7, 20)]),
        )
        .unwrap();
    assert_eq!(created.slug, "the-forest-hiker");
    assert_eq!(created.version, 0);
    assert_eq!(created.start_dates, vec![at(2021, 4, 25), at(2021, 7, 20)]);

    let loaded = repo.get_tour_by_id(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);

    let updates = UpdateTour {
        price: Some(450.0),
        difficulty: Some(Difficulty::Medium),
        start_dates: Some(vec![at(2022, 3, 1)]),
        ..UpdateTour::default()
    }
    .name("The Forest Wanderer");
    let updated = repo.update_tour(created.id, &updates).unwrap().unwrap();
    assert_eq!(updated.name, "The Forest Wanderer");
    assert_eq!(updated.slug, "the-forest-wanderer");
    assert_eq!(updated.price, 450.0);
    assert_eq!(updated.difficulty, Difficulty::Medium);
    assert_eq!(updated.duration, created.duration);
    assert_eq!(updated.start_dates, vec![at(2022, 3, 1)]);
    assert_eq!(updated.version, 1);

    assert!(repo.delete_tour(created.id).unwrap());
    assert!(repo.get_tour_by_id(created.id).unwrap().is_none());
    assert!(!repo.delete_tour(created.id).unwrap());
}

#[test]
fn test_missing_tour_is_reported_as_absent() {
    let test_db = common::TestDb::new("test_missing_tour_is_reported_as_absent.db");
    let repo = DieselRepository::new(test_db.pool());
    let id = TourId::new(42).unwrap();

    assert!(repo.get_tour_by_id(id).unwrap().is_none());
    let updates = UpdateTour {
        price: Some(1.0),
        ..UpdateTour::default()
    };
    assert!(repo.update_tour(id, &updates).unwrap().is_none());
    assert!(!repo.delete_tour(id).unwrap());
}

#[test]
fn test_duplicate_name_is_rejected() {
    let test_db = common::TestDb::new("test_duplicate_name_is_rejected.db");
    let repo = DieselRepository::new(test_db.pool());

    repo.create_tour(&new_tour("The Sea Explorer", 497.0, at(2024, 1, 1)))
        .unwrap();
    let err = repo
        .create_tour(&new_tour("The Sea Explorer", 10.0, at(2024, 1, 2)))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::DuplicateValue(column) if column == "name"));
}

#[test]
fn test_list_sorts_newest_first_and_paginates() {
    let test_db = common::TestDb::new("test_list_sorts_newest_first_and_paginates.db");
    let repo = DieselRepository::new(test_db.pool());
    for (day, name) in [(1, "The Park Camper"), (2, "The Sports Lover"), (3, "The Wine Taster")] {
        repo.create_tour(&new_tour(name, 100.0 * f64::from(day), at(2024, 1, day)))
            .unwrap();
    }

    let names = |query: &TourQuery| -> Vec<String> {
        repo.list_tours(query)
            .unwrap()
            .into_iter()
            .map(|tour| tour.name)
            .collect()
    };

    assert_eq!(
        names(&TourQuery::new()),
        vec!["The Wine Taster", "The Sports Lover", "The Park Camper"]
    );
    assert_eq!(
        names(&TourQuery::new().paginate(2, 2)),
        vec!["The Park Camper"]
    );
    assert!(names(&TourQuery::new().paginate(5, 2)).is_empty());
    assert_eq!(
        names(&TourQuery::new().sort_by(SortKey::asc(TourField::Price))),
        vec!["The Park Camper", "The Sports Lover", "The Wine Taster"]
    );
}

#[test]
fn test_list_applies_filters_as_intersection() {
    let test_db = common::TestDb::new("test_list_applies_filters_as_intersection.db");
    let repo = DieselRepository::new(test_db.pool());
    repo.create_tour(&new_tour("The City Wanderer", 1197.0, at(2024, 1, 1)))
        .unwrap();
    repo.create_tour(&new_tour("The Star Gazer", 997.0, at(2024, 1, 2)))
        .unwrap();
    repo.create_tour(&new_tour("The Northern Lights", 1497.0, at(2024, 1, 3)))
        .unwrap();

    let query = TourQuery::from_params([("price[gte]", "1000"), ("price[lt]", "1400")]).unwrap();
    let tours = repo.list_tours(&query).unwrap();
    assert_eq!(tours.len(), 1);
    assert_eq!(tours[0].name, "The City Wanderer");

    let query = TourQuery::new().filter(
        TourField::Difficulty,
        Comparison::Eq,
        FilterValue::Text("EASY".to_string()),
    );
    assert_eq!(repo.list_tours(&query).unwrap().len(), 3);
}

#[test]
fn test_top_cheap_prefers_rating_then_price() {
    let test_db = common::TestDb::new("test_top_cheap_prefers_rating_then_price.db");
    let repo = DieselRepository::new(test_db.pool());
    let rated = [
        ("The Forest Hiker", 397.0, 4.7),
        ("The Sea Explorer", 497.0, 4.8),
        ("The Snow Adventurer", 997.0, 4.5),
        ("The City Wanderer", 1197.0, 4.6),
        ("The Park Camper", 1497.0, 4.9),
        ("The Sports Lover", 2997.0, 4.7),
        ("The Wine Taster", 1997.0, 4.5),
    ];
    for (day, (name, price, rating)) in (1..).zip(rated) {
        repo.create_tour(&new_tour(name, price, at(2024, 1, day)).ratings(rating, 10))
            .unwrap();
    }

    let tours = repo.list_tours(&TourQuery::new().top_cheap()).unwrap();
    let names: Vec<&str> = tours.iter().map(|tour| tour.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "The Park Camper",
            "The Sea Explorer",
            "The Forest Hiker",
            "The Sports Lover",
            "The City Wanderer",
        ]
    );
}

#[test]
fn test_tour_stats_groups_by_difficulty() {
    let test_db = common::TestDb::new("test_tour_stats_groups_by_difficulty.db");
    let repo = DieselRepository::new(test_db.pool());

    let mut medium = new_tour("The Sea Explorer", 500.0, at(2024, 1, 1)).ratings(4.8, 10);
    medium.difficulty = Difficulty::Medium;
    let mut medium_too = new_tour("The Star Gazer", 1500.0, at(2024, 1, 2)).ratings(4.6, 20);
    medium_too.difficulty = Difficulty::Medium;
    let mut difficult = new_tour("The Snow Adventurer", 3000.0, at(2024, 1, 3)).ratings(4.5, 5);
    difficult.difficulty = Difficulty::Difficult;
    let mut low_rated = new_tour("The Wine Taster", 100.0, at(2024, 1, 4)).ratings(4.4, 3);
    low_rated.difficulty = Difficulty::Difficult;
    let easy = new_tour("The Forest Hiker", 50.0, at(2024, 1, 5)).ratings(4.9, 7);

    for tour in [medium, medium_too, difficult, low_rated, easy] {
        repo.create_tour(&tour).unwrap();
    }

    let stats = repo.tour_stats().unwrap();
    assert_eq!(stats.len(), 2);

    assert_eq!(stats[0].difficulty, "MEDIUM");
    assert_eq!(stats[0].num_tours, 2);
    assert_eq!(stats[0].num_ratings, 30);
    assert!((stats[0].avg_rating - 4.7).abs() < 1e-9);
    assert_eq!(stats[0].avg_price, 1000.0);
    assert_eq!(stats[0].min_price, 500.0);
    assert_eq!(stats[0].max_price, 1500.0);

    assert_eq!(stats[1].difficulty, "DIFFICULT");
    assert_eq!(stats[1].num_tours, 1);
    assert_eq!(stats[1].avg_price, 3000.0);
}

#[test]
fn test_tour_stats_is_empty_without_tours() {
    let test_db = common::TestDb::new("test_tour_stats_is_empty_without_tours.db");
    let repo = DieselRepository::new(test_db.pool());
    assert!(repo.tour_stats().unwrap().is_empty());
}

#[test]
fn test_monthly_plan_counts_starts_per_month() {
    let test_db = common::TestDb::new("test_monthly_plan_counts_starts_per_month.db");
    let repo = DieselRepository::new(test_db.pool());

    repo.create_tour(
        &new_tour("The Forest Hiker", 397.0, at(2024, 1, 1)).start_dates(vec![
            at(2021, 4, 25),
            at(2021, 7, 20),
            at(2022, 7, 5),
        ]),
    )
    .unwrap();
    repo.create_tour(
        &new_tour("The Sea Explorer", 497.0, at(2024, 1, 2))
            .start_dates(vec![at(2021, 7, 1), at(2021, 12, 31)]),
    )
    .unwrap();

    let plan = repo.monthly_plan(Year::new(2021).unwrap()).unwrap();
    assert_eq!(plan.len(), 3);

    assert_eq!(plan[0].month, 7);
    assert_eq!(plan[0].num_tour_starts, 2);
    assert_eq!(plan[0].tours, vec!["The Sea Explorer", "The Forest Hiker"]);

    assert_eq!(plan[1].month, 4);
    assert_eq!(plan[2].month, 12);
    assert_eq!(plan[2].tours, vec!["The Sea Explorer"]);

    assert!(repo.monthly_plan(Year::new(2030).unwrap()).unwrap().is_empty());
}

#[test]
fn test_delete_all_tours_reports_count() {
    let test_db = common::TestDb::new("test_delete_all_tours_reports_count.db");
    let repo = DieselRepository::new(test_db.pool());
    repo.create_tour(&new_tour("The Forest Hiker", 397.0, at(2024, 1, 1)).start_dates(vec![at(2021, 4, 25)]))
        .unwrap();
    repo.create_tour(&new_tour("The Sea Explorer", 497.0, at(2024, 1, 2)))
        .unwrap();

    assert_eq!(repo.delete_all_tours().unwrap(), 2);
    assert!(repo.list_tours(&TourQuery::new()).unwrap().is_empty());
}

#[test]
fn test_create_tours_is_all_or_nothing() {
    let test_db = common::TestDb::new("test_create_tours_is_all_or_nothing.db");
    let repo = DieselRepository::new(test_db.pool());

    let batch = [
        new_tour("The Forest Hiker", 397.0, at(2024, 1, 1)).start_dates(vec![at(2021, 4, 25)]),
        new_tour("The Sea Explorer", 497.0, at(2024, 1, 2)),
        new_tour("The Forest Hiker", 10.0, at(2024, 1, 3)),
    ];
    let err = repo.create_tours(&batch).unwrap_err();
    assert!(matches!(err, RepositoryError::DuplicateValue(column) if column == "name"));
    assert!(repo.list_tours(&TourQuery::new()).unwrap().is_empty());

    let created = repo.create_tours(&batch[..2]).unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0].start_dates, vec![at(2021, 4, 25)]);
    assert_eq!(repo.list_tours(&TourQuery::new()).unwrap().len(), 2);
}

#[test]
fn test_failed_import_leaves_table_empty() {
    let test_db = common::TestDb::new("test_failed_import_leaves_table_empty.db");
    let repo = DieselRepository::new(test_db.pool());

    let payload = |name: &str| {
        json!({
            "name": name,
            "duration": 5,
            "maxGroupSize": 25,
            "difficulty": "easy",
            "price": 397,
            "summary": "Breathtaking hike",
            "imageCover": "tour-1-cover.jpg"
        })
    };

    let duplicate: Vec<CreateTourForm> = serde_json::from_value(json!([
        payload("The Forest Hiker"),
        payload("The Sea Explorer"),
        payload("The Forest Hiker"),
    ]))
    .unwrap();
    assert!(matches!(
        tours_service::import_tours(&repo, duplicate),
        Err(ServiceError::Conflict(_))
    ));

    let invalid: Vec<CreateTourForm> =
        serde_json::from_value(json!([payload("The Forest Hiker"), payload("Short")])).unwrap();
    assert!(matches!(
        tours_service::import_tours(&repo, invalid),
        Err(ServiceError::Validation(_))
    ));

    assert!(repo.list_tours(&TourQuery::new()).unwrap().is_empty());
}

#[test]
fn test_update_keeps_discount_below_price() {
    let test_db = common::TestDb::new("test_update_keeps_discount_below_price.db");
    let repo = DieselRepository::new(test_db.pool());
    let tour = repo
        .create_tour(&new_tour("The Forest Hiker", 397.0, at(2024, 1, 1)).price_discount(Some(97.0)))
        .unwrap();

    for updates in [
        UpdateTour {
            price_discount: Some(5000.0),
            ..UpdateTour::default()
        },
        UpdateTour {
            price: Some(10.0),
            ..UpdateTour::default()
        },
    ] {
        let err = repo.update_tour(tour.id, &updates).unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError(_)));
    }

    let stored = repo.get_tour_by_id(tour.id).unwrap().unwrap();
    assert_eq!(stored.price, 397.0);
    assert_eq!(stored.price_discount, Some(97.0));
    assert_eq!(stored.version, 0);
}
