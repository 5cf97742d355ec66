#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tours_api::application::services::TourService;
use tours_api::infrastructure::persistence::PgTourRepository;
use tours_api::state::AppState;

pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 0, 0).unwrap()
}

pub async fn create_test_tour(
    pool: &PgPool,
    name: &str,
    difficulty: &str,
    price: f64,
    ratings_average: f64,
    start_dates: Vec<DateTime<Utc>>,
) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO tours (
            name, duration, max_group_size, difficulty, ratings_average,
            ratings_quantity, price, summary, image_cover, start_dates
        )
        VALUES ($1, 5, 10, $2, $3, 10, $4, 'A test tour', 'cover.jpg', $5)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(difficulty)
    .bind(ratings_average)
    .bind(price)
    .bind(start_dates)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Five tours, four of them rated 4.5 or better.
pub async fn seed_tours(pool: &PgPool) {
    create_test_tour(
        pool,
        "The Forest Hiker",
        "easy",
        397.0,
        4.7,
        vec![date(2021, 4, 25), date(2021, 7, 20)],
    )
    .await;
    create_test_tour(
        pool,
        "The Sea Explorer",
        "medium",
        497.0,
        4.8,
        vec![date(2021, 6, 19), date(2021, 7, 20)],
    )
    .await;
    create_test_tour(
        pool,
        "The Snow Adventurer",
        "difficult",
        997.0,
        4.5,
        vec![date(2021, 7, 19), date(2022, 1, 5)],
    )
    .await;
    create_test_tour(
        pool,
        "The City Wanderer",
        "easy",
        1197.0,
        4.6,
        vec![date(2021, 3, 11)],
    )
    .await;
    create_test_tour(
        pool,
        "The Park Camper",
        "medium",
        1497.0,
        4.2,
        vec![date(2021, 8, 5)],
    )
    .await;
}

pub fn create_test_state(pool: PgPool) -> AppState {
    let repository = Arc::new(PgTourRepository::new(Arc::new(pool)));
    AppState::new(Arc::new(TourService::new(repository, 1000)))
}
