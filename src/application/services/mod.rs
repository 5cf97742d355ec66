//! Business logic services for the application layer.

pub mod tour_service;

pub use tour_service::TourService;
