//! Query feature pipeline: filter, sort, field projection and pagination.
//!
//! [`QueryFeatures`] turns a [`QueryString`] into a [`TourQuery`], a pending
//! query description. Nothing touches the database while the pipeline runs;
//! the repository executes the finished query.
//!
//! ```rust,ignore
//! let query = QueryFeatures::new(TourQuery::default(), query_string)
//!     .filter()?
//!     .sort()
//!     .limit_fields()
//!     .paginate()
//!     .into_query();
//! ```

use crate::domain::query::fields::{FilterValue, TourField};
use crate::domain::query::query_string::{QueryString, QueryValue};
use crate::error::StoreError;

/// Keys that drive the pipeline itself and never act as filters.
pub const RESERVED_KEYS: [&str; 4] = ["page", "sort", "limit", "fields"];

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 100;
/// Page size cap applied when no other cap is configured.
pub const DEFAULT_MAX_LIMIT: i64 = 1000;

/// Comparison applied between a column and a bound value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    /// Maps a query-string operator (`price[gte]`) to a comparison.
    ///
    /// Returns `None` for operators the pipeline does not support.
    pub fn from_operator(operator: &str) -> Option<Self> {
        match operator {
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

/// One predicate of the `WHERE` clause. Predicates are combined with `AND`.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        field: TourField,
        comparison: Comparison,
        value: FilterValue,
    },
    /// Matches any of the values (repeated query keys).
    AnyOf {
        field: TourField,
        values: Vec<FilterValue>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: TourField,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(field: TourField) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub fn desc(field: TourField) -> Self {
        Self {
            field,
            descending: true,
        }
    }
}

/// A pending list query over tours.
#[derive(Debug, Clone, PartialEq)]
pub struct TourQuery {
    pub conditions: Vec<Condition>,
    /// Always ends with the identity column as a tiebreaker.
    pub sort: Vec<SortKey>,
    /// Fields returned per document, identity first.
    pub projection: Vec<TourField>,
    pub skip: i64,
    pub limit: i64,
}

impl TourQuery {
    /// Newest first.
    pub fn default_sort() -> Vec<SortKey> {
        vec![SortKey::desc(TourField::CreatedAt), SortKey::asc(TourField::Id)]
    }

    /// Every field except internal bookkeeping.
    pub fn default_projection() -> Vec<TourField> {
        TourField::ALL
            .into_iter()
            .filter(|field| !field.is_internal())
            .collect()
    }
}

impl Default for TourQuery {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
            sort: Self::default_sort(),
            projection: Self::default_projection(),
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Builds a [`TourQuery`] from client parameters.
///
/// Each stage consumes the pipeline and returns the next value, so stages
/// chain and no stage observes another's intermediate state.
#[derive(Debug, Clone)]
pub struct QueryFeatures {
    query: TourQuery,
    query_string: QueryString,
    max_limit: i64,
}

impl QueryFeatures {
    pub fn new(query: TourQuery, query_string: QueryString) -> Self {
        Self {
            query,
            query_string,
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }

    /// Caps the page size [`Self::paginate`] may produce.
    pub fn with_max_limit(mut self, max_limit: i64) -> Self {
        self.max_limit = max_limit.max(1);
        self
    }

    /// Runs every stage in the fixed order filter → sort → limit_fields → paginate.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cast`] if a filter value does not fit its field.
    pub fn apply_all(self) -> Result<TourQuery, StoreError> {
        Ok(self
            .filter()?
            .sort()
            .limit_fields()
            .paginate()
            .into_query())
    }

    /// Adds a condition for every non-reserved key naming a tour field.
    ///
    /// - `key=value` → equality
    /// - `key=a&key=b` → any of the values
    /// - `key[gte]=v` (also `gt`, `lte`, `lt`) → comparison
    ///
    /// Unknown keys and unsupported operators are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cast`] if a value cannot be cast to the field's type.
    pub fn filter(mut self) -> Result<Self, StoreError> {
        for (key, value) in self.query_string.iter() {
            if RESERVED_KEYS.contains(&key) {
                continue;
            }

            let Some(field) = TourField::from_api_name(key) else {
                tracing::debug!(key, "Ignoring filter on unknown field");
                continue;
            };
            let kind = field.kind();

            match value {
                QueryValue::Single(raw) => self.query.conditions.push(Condition::Compare {
                    field,
                    comparison: Comparison::Eq,
                    value: kind.cast(key, raw)?,
                }),
                QueryValue::Many(raws) => {
                    let values = raws
                        .iter()
                        .map(|raw| kind.cast(key, raw))
                        .collect::<Result<Vec<_>, _>>()?;
                    self.query
                        .conditions
                        .push(Condition::AnyOf { field, values });
                }
                QueryValue::Operators(operators) => {
                    for (operator, raw) in operators {
                        let Some(comparison) = Comparison::from_operator(operator) else {
                            tracing::debug!(key, operator, "Ignoring unsupported operator");
                            continue;
                        };
                        self.query.conditions.push(Condition::Compare {
                            field,
                            comparison,
                            value: kind.cast(key, raw)?,
                        });
                    }
                }
            }
        }

        Ok(self)
    }

    /// Applies `sort=a,-b`: `-` means descending. Defaults to newest first.
    pub fn sort(mut self) -> Self {
        let mut keys: Vec<SortKey> = Vec::new();

        for token in self.list_param("sort") {
            let (name, descending) = match token.strip_prefix('-') {
                Some(name) => (name, true),
                None => (token.as_str(), false),
            };

            let Some(field) = TourField::from_api_name(name) else {
                continue;
            };
            if keys.iter().any(|key| key.field == field) {
                continue;
            }
            keys.push(SortKey { field, descending });
        }

        if keys.is_empty() {
            self.query.sort = TourQuery::default_sort();
            return self;
        }

        if !keys.iter().any(|key| key.field == TourField::Id) {
            keys.push(SortKey::asc(TourField::Id));
        }
        self.query.sort = keys;
        self
    }

    /// Applies `fields=a,b`: only the named fields plus `id` are returned.
    ///
    /// When every listed name starts with `-`, those fields are removed from
    /// the default projection instead. Without `fields`, internal bookkeeping
    /// is hidden.
    pub fn limit_fields(mut self) -> Self {
        let tokens = self.list_param("fields");
        let excluding = !tokens.is_empty() && tokens.iter().all(|token| token.starts_with('-'));

        let projection = if excluding {
            let excluded: Vec<TourField> = tokens
                .iter()
                .filter_map(|token| TourField::from_api_name(&token[1..]))
                .collect();
            TourQuery::default_projection()
                .into_iter()
                .filter(|field| *field == TourField::Id || !excluded.contains(field))
                .collect()
        } else {
            let mut included = vec![TourField::Id];
            for field in tokens
                .iter()
                .filter_map(|token| TourField::from_api_name(token))
            {
                if !included.contains(&field) {
                    included.push(field);
                }
            }
            if included.len() == 1 {
                TourQuery::default_projection()
            } else {
                included
            }
        };

        self.query.projection = projection;
        self
    }

    /// Applies `page` (default 1) and `limit` (default 100, capped).
    ///
    /// Values that are not positive integers fall back to the defaults.
    pub fn paginate(mut self) -> Self {
        let page = self.positive_param("page").unwrap_or(DEFAULT_PAGE);
        let limit = self
            .positive_param("limit")
            .unwrap_or(DEFAULT_LIMIT)
            .min(self.max_limit);

        self.query.skip = (page - 1).saturating_mul(limit);
        self.query.limit = limit;
        self
    }

    pub fn into_query(self) -> TourQuery {
        self.query
    }

    /// Comma-separated tokens of a parameter, trimmed, empty ones dropped.
    fn list_param(&self, key: &str) -> Vec<String> {
        self.query_string
            .get(key)
            .map(QueryValue::values)
            .unwrap_or_default()
            .into_iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn positive_param(&self, key: &str) -> Option<i64> {
        self.query_string
            .get_single(key)
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|value| *value > 0)
    }
}
