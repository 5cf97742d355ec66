//! Application layer services implementing business logic.
//!
//! Services consume repository traits and provide a clean API for HTTP
//! handlers.
//!
//! # Available Services
//!
//! - [`services::tour_service::TourService`] - Tour listing, CRUD and aggregations

pub mod services;
