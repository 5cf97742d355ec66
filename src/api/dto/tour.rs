//! DTOs for the tour endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use serde_with::serde_as;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::entities::{DEFAULT_RATINGS_AVERAGE, DIFFICULTIES, NewTour, Tour, TourPatch};
use crate::domain::repositories::{DifficultyStats, MonthlyPlanEntry};

/// Request body for `POST /api/v1/tours`.
///
/// Every field is optional at the JSON level so that missing required
/// fields are reported by validation, all at once, instead of by the
/// JSON extractor one at a time.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_create_discount", skip_on_field_errors = false))]
pub struct CreateTourRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(required(message = "A tour must have a name"))]
    #[validate(length(
        min = 10,
        max = 40,
        message = "A tour name must have between 10 and 40 characters"
    ))]
    pub name: Option<String>,

    #[validate(required(message = "A tour must have a duration"))]
    #[validate(range(min = 1, message = "A tour must last at least one day"))]
    pub duration: Option<i32>,

    #[validate(required(message = "A tour must have a group size"))]
    #[validate(range(min = 1, message = "A tour group must have at least one member"))]
    pub max_group_size: Option<i32>,

    #[validate(required(message = "A tour must have a difficulty"))]
    #[validate(custom(function = "validate_difficulty"))]
    pub difficulty: Option<String>,

    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1.0 and 5.0"))]
    pub ratings_average: Option<f64>,

    #[validate(range(min = 0, message = "Ratings quantity cannot be negative"))]
    pub ratings_quantity: Option<i32>,

    #[validate(required(message = "A tour must have a price"))]
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,

    pub price_discount: Option<f64>,

    #[serde(default, deserialize_with = "trimmed")]
    #[validate(required(message = "A tour must have a summary"))]
    pub summary: Option<String>,

    #[serde(default, deserialize_with = "trimmed")]
    pub description: Option<String>,

    #[validate(required(message = "A tour must have a cover image"))]
    pub image_cover: Option<String>,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,
}

impl CreateTourRequest {
    /// Validates the payload and converts it, applying defaults.
    ///
    /// # Errors
    ///
    /// Returns every violated field rule.
    pub fn into_new_tour(self) -> Result<NewTour, ValidationErrors> {
        self.validate()?;

        let (
            Some(name),
            Some(duration),
            Some(max_group_size),
            Some(difficulty),
            Some(price),
            Some(summary),
            Some(image_cover),
        ) = (
            self.name,
            self.duration,
            self.max_group_size,
            self.difficulty,
            self.price,
            self.summary,
            self.image_cover,
        )
        else {
            return Err(ValidationErrors::new());
        };

        Ok(NewTour {
            name,
            duration,
            max_group_size,
            difficulty,
            ratings_average: self.ratings_average.unwrap_or(DEFAULT_RATINGS_AVERAGE),
            ratings_quantity: self.ratings_quantity.unwrap_or(0),
            price,
            price_discount: self.price_discount,
            summary,
            description: self.description,
            image_cover,
            images: self.images,
            start_dates: self.start_dates,
        })
    }
}

/// Request body for `PATCH /api/v1/tours/{id}`.
///
/// Only provided fields change. For `priceDiscount` and `description`,
/// `null` clears the stored value.
#[serde_as]
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_update_discount", skip_on_field_errors = false))]
pub struct UpdateTourRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(
        min = 10,
        max = 40,
        message = "A tour name must have between 10 and 40 characters"
    ))]
    pub name: Option<String>,

    #[validate(range(min = 1, message = "A tour must last at least one day"))]
    pub duration: Option<i32>,

    #[validate(range(min = 1, message = "A tour group must have at least one member"))]
    pub max_group_size: Option<i32>,

    #[validate(custom(function = "validate_difficulty"))]
    pub difficulty: Option<String>,

    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1.0 and 5.0"))]
    pub ratings_average: Option<f64>,

    #[validate(range(min = 0, message = "Ratings quantity cannot be negative"))]
    pub ratings_quantity: Option<i32>,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,

    /// Absent = no change, null = clear, value = set.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub price_discount: Option<Option<f64>>,

    #[serde(default, deserialize_with = "trimmed")]
    pub summary: Option<String>,

    /// Absent = no change, null = clear, value = set.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,

    pub image_cover: Option<String>,

    pub images: Option<Vec<String>>,

    pub start_dates: Option<Vec<DateTime<Utc>>>,
}

impl UpdateTourRequest {
    /// Validates the payload and converts it to a patch.
    ///
    /// # Errors
    ///
    /// Returns every violated field rule.
    pub fn into_patch(self) -> Result<TourPatch, ValidationErrors> {
        self.validate()?;

        Ok(TourPatch {
            name: self.name,
            duration: self.duration,
            max_group_size: self.max_group_size,
            difficulty: self.difficulty,
            ratings_average: self.ratings_average,
            ratings_quantity: self.ratings_quantity,
            price: self.price,
            price_discount: self.price_discount,
            summary: self.summary,
            description: self
                .description
                .map(|description| description.map(|text| text.trim().to_string())),
            image_cover: self.image_cover,
            images: self.images,
            start_dates: self.start_dates,
        })
    }
}

fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(|value| value.trim().to_string()))
}

fn validate_difficulty(difficulty: &str) -> Result<(), ValidationError> {
    if DIFFICULTIES.contains(&difficulty) {
        Ok(())
    } else {
        Err(ValidationError::new("difficulty")
            .with_message("Difficulty is either: easy, medium, difficult".into()))
    }
}

fn discount_error() -> ValidationError {
    ValidationError::new("price_discount")
        .with_message("Discount price should be below the regular price".into())
}

fn validate_create_discount(request: &CreateTourRequest) -> Result<(), ValidationError> {
    match (request.price_discount, request.price) {
        (Some(discount), Some(price)) if discount >= price => Err(discount_error()),
        _ => Ok(()),
    }
}

/// Only checked when both values are in the payload; the stored price is
/// guarded by the table constraint.
fn validate_update_discount(request: &UpdateTourRequest) -> Result<(), ValidationError> {
    match (request.price_discount, request.price) {
        (Some(Some(discount)), Some(price)) if discount >= price => Err(discount_error()),
        _ => Ok(()),
    }
}

/// `data` of list responses.
#[derive(Debug, Serialize)]
pub struct ToursData {
    pub tours: Vec<Value>,
}

/// `data` of single-tour responses.
#[derive(Debug, Serialize)]
pub struct TourData {
    pub tour: Tour,
}

#[derive(Debug, Serialize)]
pub struct StatsData {
    pub stats: Vec<DifficultyStats>,
}

#[derive(Debug, Serialize)]
pub struct PlanData {
    pub plan: Vec<MonthlyPlanEntry>,
}
