//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod fallback;
pub mod health;
pub mod tours;

pub use fallback::not_found_handler;
pub use health::health_handler;
pub use tours::{
    create_tour_handler, delete_tour_handler, get_tour_handler, list_tours_handler,
    monthly_plan_handler, top_cheap_tours_handler, tour_stats_handler, update_tour_handler,
};
