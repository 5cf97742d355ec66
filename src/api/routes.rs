//! API route configuration.

use crate::api::handlers::{
    create_tour_handler, delete_tour_handler, get_tour_handler, list_tours_handler,
    monthly_plan_handler, top_cheap_tours_handler, tour_stats_handler, update_tour_handler,
};
use crate::state::AppState;
use axum::{Router, routing::get};

/// Tour routes, mounted under `/api/v1/tours`.
///
/// # Endpoints
///
/// - `GET    /`                     - List tours (filter, sort, fields, pagination)
/// - `POST   /`                     - Create a tour
/// - `GET    /top-5-cheap`          - Five best-rated, cheapest tours
/// - `GET    /stats`                - Statistics per difficulty
/// - `GET    /monthly-plan/{year}`  - Tour starts per month of a year
/// - `GET    /{id}`                 - Get a tour
/// - `PATCH  /{id}`                 - Partially update a tour
/// - `DELETE /{id}`                 - Delete a tour
///
/// Static segments win over `/{id}`.
pub fn tour_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tours_handler).post(create_tour_handler))
        .route("/top-5-cheap", get(top_cheap_tours_handler))
        .route("/stats", get(tour_stats_handler))
        .route("/monthly-plan/{year}", get(monthly_plan_handler))
        .route(
            "/{id}",
            get(get_tour_handler)
                .patch(update_tour_handler)
                .delete(delete_tour_handler),
        )
}
