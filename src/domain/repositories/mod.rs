//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated
//! via `mockall` for unit tests.
//!
//! See integration tests in `tests/repository_tour.rs` for usage examples.

pub mod tour_repository;

pub use tour_repository::{DifficultyStats, MonthlyPlanEntry, TourRepository};

#[cfg(test)]
pub use tour_repository::MockTourRepository;
