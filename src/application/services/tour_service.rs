//! Tour listing, CRUD and aggregation service.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::entities::{NewTour, Tour, TourPatch};
use crate::domain::query::{QueryFeatures, QueryString, TourQuery};
use crate::domain::repositories::{DifficultyStats, MonthlyPlanEntry, TourRepository};
use crate::error::{ApiError, AppError, StoreError};

/// Minimum average rating a tour needs to count in [`TourService::tour_stats`].
pub const STATS_MIN_RATING: f64 = 4.5;

/// Service behind the tour endpoints.
///
/// Parses identifiers, runs the query pipeline and turns missing records into
/// 404 errors. Storage failures are passed through untouched for the error
/// middleware to classify.
pub struct TourService {
    repository: Arc<dyn TourRepository>,
    max_page_limit: i64,
}

impl TourService {
    /// Creates a new tour service.
    ///
    /// `max_page_limit` caps the `limit` list parameter.
    pub fn new(repository: Arc<dyn TourRepository>, max_page_limit: i64) -> Self {
        Self {
            repository,
            max_page_limit,
        }
    }

    /// Lists tours matching the client's query string.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cast`] if a filter value does not fit its field.
    pub async fn list_tours(&self, query_string: QueryString) -> Result<Vec<Value>, ApiError> {
        let query = QueryFeatures::new(TourQuery::default(), query_string)
            .with_max_limit(self.max_page_limit)
            .apply_all()?;

        tracing::debug!(?query, "Executing tour query");

        Ok(self.repository.find(query).await?)
    }

    /// Retrieves a tour by its raw path identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cast`] if `raw_id` is not an identifier and a
    /// 404 [`AppError`] if no tour has it.
    pub async fn get_tour(&self, raw_id: &str) -> Result<Tour, ApiError> {
        let id = parse_id(raw_id)?;

        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(raw_id))
    }

    /// Creates a tour.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if the name is taken.
    pub async fn create_tour(&self, new_tour: NewTour) -> Result<Tour, ApiError> {
        let tour = self.repository.create(new_tour).await?;
        tracing::info!(tour_id = tour.id, name = %tour.name, "Tour created");
        Ok(tour)
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_tour`], plus storage constraint violations.
    pub async fn update_tour(&self, raw_id: &str, patch: TourPatch) -> Result<Tour, ApiError> {
        let id = parse_id(raw_id)?;

        let updated = if patch.is_empty() {
            self.repository.find_by_id(id).await?
        } else {
            self.repository.update(id, patch).await?
        };

        updated.ok_or_else(|| not_found(raw_id))
    }

    /// Deletes a tour.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_tour`].
    pub async fn delete_tour(&self, raw_id: &str) -> Result<(), ApiError> {
        let id = parse_id(raw_id)?;

        if !self.repository.delete(id).await? {
            return Err(not_found(raw_id));
        }

        tracing::info!(tour_id = id, "Tour deleted");
        Ok(())
    }

    /// Statistics per difficulty over well-rated tours.
    pub async fn tour_stats(&self) -> Result<Vec<DifficultyStats>, ApiError> {
        Ok(self.repository.stats(STATS_MIN_RATING).await?)
    }

    /// Busiest months of `raw_year`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cast`] if `raw_year` is not a year between 1 and 9999.
    pub async fn monthly_plan(&self, raw_year: &str) -> Result<Vec<MonthlyPlanEntry>, ApiError> {
        let year = raw_year
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|year| (1..=9999).contains(year))
            .ok_or_else(|| StoreError::cast("year", raw_year, "Number"))?;

        Ok(self.repository.monthly_plan(year).await?)
    }

    /// Checks that the store answers.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.repository.ping().await
    }
}

fn parse_id(raw_id: &str) -> Result<i64, StoreError> {
    raw_id
        .parse::<i64>()
        .map_err(|_| StoreError::cast("id", raw_id, "Number"))
}

fn not_found(raw_id: &str) -> ApiError {
    AppError::not_found(format!("No tour found with the given ID: {raw_id}")).into()
}
