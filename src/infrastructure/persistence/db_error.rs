//! Classification of PostgreSQL driver errors into [`StoreError`] shapes.

use std::sync::LazyLock;

use regex::Regex;
use sqlx::postgres::PgDatabaseError;

use crate::domain::query::TourField;
use crate::error::StoreError;

const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";
const NOT_NULL_VIOLATION: &str = "23502";
const INVALID_TEXT_REPRESENTATION: &str = "22P02";
const CHARACTER_NOT_IN_REPERTOIRE: &str = "22021";

/// `Key (name)=(The Forest Hiker) already exists.`
static DUPLICATE_DETAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Key \((?P<field>[^)]+)\)=\((?P<value>.*)\) already exists\.?$")
        .expect("Invalid duplicate detail regex")
});

/// `invalid input syntax for type integer: "abc"`
static INVALID_INPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"invalid input syntax for type (?P<kind>[\w ]+): "(?P<value>.*)""#)
        .expect("Invalid input syntax regex")
});

/// Maps a driver error to the storage failure shape it represents.
///
/// Unrecognized errors are kept whole in [`StoreError::Database`].
pub fn map_sqlx_error(error: sqlx::Error) -> StoreError {
    if let Some(db) = error.as_database_error() {
        let pg = db.try_downcast_ref::<PgDatabaseError>();

        let classified = match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => Some(duplicate_key(
                pg.and_then(PgDatabaseError::detail),
                db.constraint(),
            )),
            Some(CHECK_VIOLATION) => Some(StoreError::Validation(vec![check_message(
                db.constraint(),
            )])),
            Some(NOT_NULL_VIOLATION) => {
                let column = pg.and_then(PgDatabaseError::column).unwrap_or("field");
                Some(StoreError::Validation(vec![format!(
                    "A tour must have a {}",
                    api_name(column)
                )]))
            }
            Some(INVALID_TEXT_REPRESENTATION | CHARACTER_NOT_IN_REPERTOIRE) => {
                Some(invalid_input(db.message(), pg.and_then(PgDatabaseError::column)))
            }
            _ => None,
        };

        if let Some(classified) = classified {
            return classified;
        }
    }

    StoreError::Database(error)
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        map_sqlx_error(error)
    }
}

fn duplicate_key(detail: Option<&str>, constraint: Option<&str>) -> StoreError {
    if let Some(captures) = detail.and_then(|detail| DUPLICATE_DETAIL.captures(detail)) {
        return StoreError::DuplicateKey {
            field: api_name(&captures["field"]),
            value: captures["value"].to_string(),
        };
    }

    // Fall back to the constraint name, `tours_<column>_key`.
    let field = constraint
        .and_then(|name| name.strip_prefix("tours_"))
        .and_then(|name| name.strip_suffix("_key"))
        .map(api_name)
        .unwrap_or_else(|| "unknown".to_string());

    StoreError::DuplicateKey {
        field,
        value: String::new(),
    }
}

fn check_message(constraint: Option<&str>) -> String {
    match constraint {
        Some("tours_price_discount_check") => {
            "Discount price should be below the regular price".to_string()
        }
        Some("tours_difficulty_check") => "Difficulty is either: easy, medium, difficult".to_string(),
        Some("tours_ratings_average_check") => "Rating must be between 1.0 and 5.0".to_string(),
        Some("tours_duration_check") => "A tour must last at least one day".to_string(),
        Some("tours_max_group_size_check") => {
            "A tour group must have at least one member".to_string()
        }
        Some("tours_ratings_quantity_check") => "Ratings quantity cannot be negative".to_string(),
        Some("tours_price_check") => "Price cannot be negative".to_string(),
        Some(other) => format!("Constraint {other} was violated"),
        None => "A field rule was violated".to_string(),
    }
}

fn invalid_input(message: &str, column: Option<&str>) -> StoreError {
    let path = column.map(api_name).unwrap_or_else(|| "value".to_string());

    match INVALID_INPUT.captures(message) {
        Some(captures) => {
            let kind = match &captures["kind"] {
                "integer" | "bigint" | "smallint" | "double precision" | "numeric" => "Number",
                kind if kind.starts_with("timestamp") || kind == "date" => "Date",
                _ => "String",
            };
            StoreError::cast(path, &captures["value"], kind)
        }
        None => StoreError::cast(path, message, "String"),
    }
}

/// Client-facing name of a column, or the column itself if it is not a tour field.
fn api_name(column: &str) -> String {
    TourField::from_column(column)
        .map(|field| field.api_name().to_string())
        .unwrap_or_else(|| column.to_string())
}
