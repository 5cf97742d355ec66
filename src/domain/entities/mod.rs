//! Core domain entities.
//!
//! Entities are plain data structures without business logic. Creation and
//! partial updates use dedicated structs:
//!
//! - [`Tour`] - a stored tour
//! - [`NewTour`] - input for creating a tour
//! - [`TourPatch`] - partial update

pub mod tour;

pub use tour::{DEFAULT_RATINGS_AVERAGE, DIFFICULTIES, NewTour, Tour, TourPatch};
