//! Request timestamping middleware.

use std::convert::Infallible;
use std::time::Instant;

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};

/// When the request entered the service.
#[derive(Debug, Clone, Copy)]
pub struct RequestTime {
    started: Instant,
    at: DateTime<Utc>,
}

impl RequestTime {
    pub fn now() -> Self {
        Self {
            started: Instant::now(),
            at: Utc::now(),
        }
    }

    /// Wall-clock arrival time.
    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    /// Milliseconds spent since arrival.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Stamps every request with a [`RequestTime`] extension.
pub async fn layer(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(RequestTime::now());
    next.run(request).await
}

/// Reads the stamp set by [`layer`], or stamps now if the layer is missing.
impl<S> FromRequestParts<S> for RequestTime
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestTime>()
            .copied()
            .unwrap_or_else(RequestTime::now))
    }
}
