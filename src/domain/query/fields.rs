//! Registry of tour fields that queries may reference.
//!
//! Only names found here ever reach SQL, as column identifiers. Client values
//! are always bound as parameters after being cast to the field's type.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::StoreError;

/// Storage type of a field, or of its elements for array fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    Text,
    Timestamp,
}

impl FieldKind {
    /// Type name reported in cast errors.
    pub fn name(self) -> &'static str {
        match self {
            Self::Integer | Self::Float => "Number",
            Self::Text => "String",
            Self::Timestamp => "Date",
        }
    }

    /// Casts a raw query-string value to this kind.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cast`] naming `path` and the offending value.
    pub fn cast(self, path: &str, raw: &str) -> Result<FilterValue, StoreError> {
        let trimmed = raw.trim();
        let cast_error = || StoreError::cast(path, raw, self.name());

        match self {
            Self::Integer => trimmed
                .parse::<i64>()
                .map(FilterValue::Integer)
                .map_err(|_| cast_error()),
            Self::Float => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(FilterValue::Float)
                .ok_or_else(cast_error),
            // Postgres text cannot hold NUL.
            Self::Text if raw.contains('\0') => Err(cast_error()),
            Self::Text => Ok(FilterValue::Text(raw.to_string())),
            Self::Timestamp => parse_timestamp(trimmed)
                .map(FilterValue::Timestamp)
                .ok_or_else(cast_error),
        }
    }
}

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates (midnight UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// A client value after casting to the target field's type.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

/// Fields of the `tours` table addressable from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TourField {
    Id,
    Name,
    Duration,
    MaxGroupSize,
    Difficulty,
    RatingsAverage,
    RatingsQuantity,
    Price,
    PriceDiscount,
    Summary,
    Description,
    ImageCover,
    Images,
    StartDates,
    CreatedAt,
    /// Internal bookkeeping, hidden unless explicitly selected.
    Version,
}

impl TourField {
    pub const ALL: [TourField; 16] = [
        Self::Id,
        Self::Name,
        Self::Duration,
        Self::MaxGroupSize,
        Self::Difficulty,
        Self::RatingsAverage,
        Self::RatingsQuantity,
        Self::Price,
        Self::PriceDiscount,
        Self::Summary,
        Self::Description,
        Self::ImageCover,
        Self::Images,
        Self::StartDates,
        Self::CreatedAt,
        Self::Version,
    ];

    /// Looks a field up by the name clients use.
    pub fn from_api_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.api_name() == name)
    }

    /// Looks a field up by its column name.
    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.column() == column)
    }

    pub fn api_name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Duration => "duration",
            Self::MaxGroupSize => "maxGroupSize",
            Self::Difficulty => "difficulty",
            Self::RatingsAverage => "ratingsAverage",
            Self::RatingsQuantity => "ratingsQuantity",
            Self::Price => "price",
            Self::PriceDiscount => "priceDiscount",
            Self::Summary => "summary",
            Self::Description => "description",
            Self::ImageCover => "imageCover",
            Self::Images => "images",
            Self::StartDates => "startDates",
            Self::CreatedAt => "createdAt",
            Self::Version => "version",
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Duration => "duration",
            Self::MaxGroupSize => "max_group_size",
            Self::Difficulty => "difficulty",
            Self::RatingsAverage => "ratings_average",
            Self::RatingsQuantity => "ratings_quantity",
            Self::Price => "price",
            Self::PriceDiscount => "price_discount",
            Self::Summary => "summary",
            Self::Description => "description",
            Self::ImageCover => "image_cover",
            Self::Images => "images",
            Self::StartDates => "start_dates",
            Self::CreatedAt => "created_at",
            Self::Version => "version",
        }
    }

    /// Scalar kind of the field (element kind for arrays).
    pub fn kind(self) -> FieldKind {
        match self {
            Self::Id
            | Self::Duration
            | Self::MaxGroupSize
            | Self::RatingsQuantity
            | Self::Version => FieldKind::Integer,
            Self::RatingsAverage | Self::Price | Self::PriceDiscount => FieldKind::Float,
            Self::Name
            | Self::Difficulty
            | Self::Summary
            | Self::Description
            | Self::ImageCover
            | Self::Images => FieldKind::Text,
            Self::StartDates | Self::CreatedAt => FieldKind::Timestamp,
        }
    }

    pub fn is_array(self) -> bool {
        matches!(self, Self::Images | Self::StartDates)
    }

    pub fn is_internal(self) -> bool {
        matches!(self, Self::Version)
    }
}
