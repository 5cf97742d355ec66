//! Tour entity, the single resource served by the API.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Difficulty levels a tour may declare.
pub const DIFFICULTIES: [&str; 3] = ["easy", "medium", "difficult"];

/// Rating given to a tour nobody has rated yet.
pub const DEFAULT_RATINGS_AVERAGE: f64 = 4.5;

/// A stored tour.
///
/// Serialized with the camelCase field names clients use in query strings.
/// `version` is internal bookkeeping and never leaves the service.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: i64,
    pub name: String,
    pub duration: i32,
    pub max_group_size: i32,
    pub difficulty: String,
    pub ratings_average: f64,
    pub ratings_quantity: i32,
    pub price: f64,
    pub price_discount: Option<f64>,
    pub summary: String,
    pub description: Option<String>,
    pub image_cover: String,
    pub images: Vec<String>,
    pub start_dates: Vec<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub version: i32,
}

/// Input data for creating a tour.
///
/// Field rules are enforced before this value is built, see
/// [`crate::api::dto::tour::CreateTourRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTour {
    pub name: String,
    pub duration: i32,
    pub max_group_size: i32,
    pub difficulty: String,
    pub ratings_average: f64,
    pub ratings_quantity: i32,
    pub price: f64,
    pub price_discount: Option<f64>,
    pub summary: String,
    pub description: Option<String>,
    pub image_cover: String,
    pub images: Vec<String>,
    pub start_dates: Vec<DateTime<Utc>>,
}

/// Partial update for an existing tour.
///
/// `None` fields are left unchanged. For nullable columns,
/// `Some(None)` clears the value and `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TourPatch {
    pub name: Option<String>,
    pub duration: Option<i32>,
    pub max_group_size: Option<i32>,
    pub difficulty: Option<String>,
    pub ratings_average: Option<f64>,
    pub ratings_quantity: Option<i32>,
    pub price: Option<f64>,
    pub price_discount: Option<Option<f64>>,
    pub summary: Option<String>,
    pub description: Option<Option<String>>,
    pub image_cover: Option<String>,
    pub images: Option<Vec<String>>,
    pub start_dates: Option<Vec<DateTime<Utc>>>,
}

impl TourPatch {
    /// Returns true if applying the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
