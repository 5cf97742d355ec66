//! Error types shared by every layer.
//!
//! - [`AppError`] - operational error raised by business rules (not found, bad input)
//! - [`StoreError`] - recognized failure shapes reported by the storage layer
//! - [`TokenError`] - signed-token failures
//! - [`ApiError`] - umbrella type returned by handlers
//!
//! Handlers never render errors themselves. Returning `Err(ApiError)` forwards the
//! error into the response, where the terminal middleware
//! ([`crate::api::middleware::error_handler`]) classifies and renders it.

use std::backtrace::Backtrace;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use validator::ValidationErrors;

use crate::api::middleware::error_handler::ForwardedError;

/// Coarse outcome reported in every error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStatus {
    /// The client sent something wrong (4xx).
    Fail,
    /// The server could not complete the request.
    Error,
}

impl ErrorStatus {
    /// Derives the status from an HTTP status code.
    pub fn from_status_code(status_code: StatusCode) -> Self {
        if status_code.is_client_error() {
            Self::Fail
        } else {
            Self::Error
        }
    }
}

/// Structured application error with an HTTP status.
///
/// `status` is derived from `status_code` once, at construction, and never
/// changes afterwards. Errors built with [`AppError::new`] are operational:
/// their message is safe to show to clients.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    message: String,
    status_code: StatusCode,
    status: ErrorStatus,
    is_operational: bool,
    stack: Arc<Backtrace>,
}

impl AppError {
    /// Creates an operational error.
    pub fn new(message: impl Into<String>, status_code: StatusCode) -> Self {
        Self::build(message.into(), status_code, true)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::UNAUTHORIZED)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::NOT_FOUND)
    }

    /// Creates a 500 for failures nobody anticipated.
    ///
    /// The message is kept for logs only; clients get a generic body.
    pub fn non_operational(message: impl Into<String>) -> Self {
        Self::build(message.into(), StatusCode::INTERNAL_SERVER_ERROR, false)
    }

    fn build(message: String, status_code: StatusCode, is_operational: bool) -> Self {
        Self {
            message,
            status_code,
            status: ErrorStatus::from_status_code(status_code),
            is_operational,
            stack: Arc::new(Backtrace::capture()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    pub fn is_operational(&self) -> bool {
        self.is_operational
    }

    /// Backtrace captured where the error was constructed.
    ///
    /// Only populated when `RUST_BACKTRACE` is set.
    pub fn backtrace(&self) -> &Backtrace {
        &self.stack
    }
}

/// Failure shapes the storage layer reports.
///
/// Raw driver errors are classified into one of these variants once, at the
/// repository boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A value could not be converted to the type of the field it targets.
    #[error("Cast to {kind} failed for value \"{value}\" at path \"{path}\"")]
    Cast {
        path: String,
        value: String,
        kind: &'static str,
    },

    /// A unique index rejected the write.
    #[error("duplicate key error: {field} = {value}")]
    DuplicateKey { field: String, value: String },

    /// Field rules rejected the document. One message per violated rule.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Anything the driver reported that is not recognized above.
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    pub fn cast(path: impl Into<String>, value: impl Into<String>, kind: &'static str) -> Self {
        Self::Cast {
            path: path.into(),
            value: value.into(),
            kind,
        }
    }
}

impl From<ValidationErrors> for StoreError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|(a, _), (b, _)| a.cmp(b));

        let messages = fields
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid ({})", error.code),
                })
            })
            .collect();

        Self::Validation(messages)
    }
}

/// Signed-token failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed or its signature is invalid")]
    Malformed,
    #[error("token has expired")]
    Expired,
}

/// Every error a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl ApiError {
    /// Short name of the error shape, shown in development responses.
    pub fn name(&self) -> &'static str {
        match self {
            Self::App(_) => "AppError",
            Self::Store(StoreError::Cast { .. }) => "CastError",
            Self::Store(StoreError::DuplicateKey { .. }) => "DuplicateKeyError",
            Self::Store(StoreError::Validation(_)) => "ValidationError",
            Self::Store(StoreError::Database(_)) => "DatabaseError",
            Self::Token(TokenError::Malformed) => "JsonWebTokenError",
            Self::Token(TokenError::Expired) => "TokenExpiredError",
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Store(errors.into())
    }
}

/// Forwards the error to the terminal error middleware.
///
/// The response produced here is a placeholder: the middleware removes the
/// [`ForwardedError`] extension and renders the real body. Without the
/// middleware installed the client sees a bare 500.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(ForwardedError::new(self));
        response
    }
}
