//! Query building for tour list requests.
//!
//! - [`query_string`] - client query-string model (`key`, `key[op]`, repeated keys)
//! - [`fields`] - addressable tour fields and value casting
//! - [`features`] - the filter → sort → limit_fields → paginate pipeline

pub mod features;
pub mod fields;
pub mod query_string;

pub use features::{Comparison, Condition, QueryFeatures, SortKey, TourQuery};
pub use fields::{FieldKind, FilterValue, TourField};
pub use query_string::{QueryString, QueryValue};
