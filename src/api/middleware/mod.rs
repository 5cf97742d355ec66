//! HTTP middleware for request processing and error rendering.
//!
//! - [`error_handler`] - terminal handler rendering every forwarded error
//! - [`request_time`] - stamps requests with their arrival time
//! - [`tracing`] - request spans and latency logs

pub mod error_handler;
pub mod request_time;
pub mod tracing;
