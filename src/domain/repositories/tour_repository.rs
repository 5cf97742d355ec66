//! Repository trait for tour data access.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::domain::entities::{NewTour, Tour, TourPatch};
use crate::domain::query::TourQuery;
use crate::error::StoreError;

/// Aggregated figures for one difficulty level.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyStats {
    /// Upper-cased difficulty, the grouping key.
    pub difficulty: String,
    pub num_tours: i64,
    pub num_ratings: i64,
    pub avg_rating: f64,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

/// Tours starting in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPlanEntry {
    /// 1 = January.
    pub month: i32,
    pub num_tours_start: i64,
    /// Names of the tours, one entry per start date in the month.
    pub tours: Vec<String>,
}

/// Repository interface for tours.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgTourRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Errors
///
/// Driver failures are classified into [`StoreError`] variants before they
/// leave the repository.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TourRepository: Send + Sync {
    /// Executes a list query built by [`crate::domain::query::QueryFeatures`].
    ///
    /// Each document is a JSON object holding only the projected fields.
    async fn find(&self, query: TourQuery) -> Result<Vec<Value>, StoreError>;

    /// Finds a tour by id.
    ///
    /// Returns `Ok(None)` if no tour has this id.
    async fn find_by_id(&self, id: i64) -> Result<Option<Tour>, StoreError>;

    /// Inserts a tour.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if the name is taken and
    /// [`StoreError::Validation`] if a table constraint rejects the row.
    async fn create(&self, new_tour: NewTour) -> Result<Tour, StoreError>;

    /// Applies a partial update and bumps the internal version.
    ///
    /// Returns `Ok(None)` if no tour has this id.
    async fn update(&self, id: i64, patch: TourPatch) -> Result<Option<Tour>, StoreError>;

    /// Deletes a tour. Returns `Ok(false)` if no tour has this id.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Per-difficulty statistics over tours rated at least `min_rating`,
    /// cheapest average price first.
    async fn stats(&self, min_rating: f64) -> Result<Vec<DifficultyStats>, StoreError>;

    /// Start dates of `year` grouped by month, busiest month first, at most 12 entries.
    async fn monthly_plan(&self, year: i32) -> Result<Vec<MonthlyPlanEntry>, StoreError>;

    /// Checks that the store answers.
    async fn ping(&self) -> Result<(), StoreError>;
}
