//! Domain layer containing business entities, query building and repository contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`query`] - Query feature pipeline turning client parameters into a pending query
//! - [`repositories`] - Data access trait definitions
//!
//! The domain layer has no dependencies on the HTTP or persistence layers;
//! repository traits are implemented in `crate::infrastructure`.

pub mod entities;
pub mod query;
pub mod repositories;
