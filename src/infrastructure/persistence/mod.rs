//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx. Queries are
//! checked at runtime, so building the crate needs no database.
//!
//! # Modules
//!
//! - [`PgTourRepository`] - tour storage, listing and aggregations
//! - [`db_error`] - driver error classification

pub mod db_error;
pub mod pg_tour_repository;

pub use db_error::map_sqlx_error;
pub use pg_tour_repository::PgTourRepository;
