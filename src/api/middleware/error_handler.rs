//! Terminal error middleware.
//!
//! Handlers and extractors never render errors. They return [`ApiError`],
//! whose `IntoResponse` impl stores it in the response as a
//! [`ForwardedError`] extension. This middleware removes the extension and
//! renders the body once, in the shape the [`Environment`] asks for.

use std::backtrace::Backtrace;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::config::Environment;
use crate::error::{ApiError, AppError, ErrorStatus, StoreError, TokenError};

/// Message shown for failures that are not safe to describe.
pub const GENERIC_MESSAGE: &str = "Something went wrong!";

/// An error travelling from a handler to [`layer`] inside a response.
#[derive(Debug, Clone)]
pub struct ForwardedError {
    error: Arc<ApiError>,
    backtrace: Arc<Backtrace>,
}

impl ForwardedError {
    pub fn new(error: ApiError) -> Self {
        Self {
            error: Arc::new(error),
            backtrace: Arc::new(Backtrace::capture()),
        }
    }

    pub fn error(&self) -> &ApiError {
        &self.error
    }

    /// Backtrace of the error itself when it has one, else of the hand-off.
    fn backtrace(&self) -> &Backtrace {
        match self.error.as_ref() {
            ApiError::App(error) => error.backtrace(),
            _ => &self.backtrace,
        }
    }
}

/// Renders forwarded errors. Responses without one pass through untouched.
///
/// # Example
///
/// ```rust,ignore
/// use axum::{Router, middleware};
/// use crate::api::middleware::error_handler;
///
/// let app = Router::new()
///     .nest("/api/v1/tours", tour_routes())
///     .layer(middleware::from_fn_with_state(Environment::Production, error_handler::layer));
/// ```
pub async fn layer(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let Some(forwarded) = response.extensions_mut().remove::<ForwardedError>() else {
        return response;
    };

    let response = match environment {
        Environment::Development => render_development(&forwarded),
        Environment::Production => render_production(forwarded.error()),
    };

    metrics::counter!("http_errors_total", "status" => response.status().as_u16().to_string())
        .increment(1);

    response
}

/// Full error details with the raw error and its stack.
fn render_development(forwarded: &ForwardedError) -> Response {
    let error = forwarded.error();

    let (status_code, status, message) = match error {
        ApiError::App(app) => (app.status_code(), app.status(), app.message().to_string()),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorStatus::Error,
            other.to_string(),
        ),
    };

    if status_code.is_server_error() {
        tracing::error!(error = %error, kind = error.name(), "Request failed");
    }

    let body = json!({
        "status": status,
        "message": message,
        "error": describe(error),
        "stack": format!("{}: {}\n{}", error.name(), error, forwarded.backtrace()),
    });

    (status_code, Json(body)).into_response()
}

/// Safe messages for operational errors, a generic 500 for everything else.
fn render_production(error: &ApiError) -> Response {
    let normalized = normalize(error);

    if !normalized.is_operational() {
        tracing::error!(error = %error, kind = error.name(), "Unexpected error");

        let body = json!({ "status": ErrorStatus::Error, "message": GENERIC_MESSAGE });
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
    }

    let body = json!({
        "status": normalized.status(),
        "message": normalized.message(),
    });

    (normalized.status_code(), Json(body)).into_response()
}

/// Maps any forwarded error to the [`AppError`] clients see in production.
pub fn normalize(error: &ApiError) -> AppError {
    match error {
        ApiError::Store(StoreError::Cast { path, value, .. }) => {
            AppError::bad_request(format!("Invalid input. {path}: {value}"))
        }
        ApiError::Store(StoreError::DuplicateKey { field, value }) => AppError::bad_request(
            format!("Duplicate field value. Value '{value}' already exists for '{field}'"),
        ),
        ApiError::Store(StoreError::Validation(messages)) => {
            AppError::bad_request(format!("Invalid inputs. Errors: {}", messages.join(". ")))
        }
        ApiError::Token(TokenError::Malformed) => {
            AppError::unauthorized("Invalid token. Please login again")
        }
        ApiError::Token(TokenError::Expired) => {
            AppError::unauthorized("Your token has expired. Please login again")
        }
        ApiError::App(app) => app.clone(),
        ApiError::Store(StoreError::Database(source)) => AppError::non_operational(source.to_string()),
    }
}

fn describe(error: &ApiError) -> Value {
    match error {
        ApiError::App(app) => json!({
            "name": error.name(),
            "statusCode": app.status_code().as_u16(),
            "status": app.status(),
            "isOperational": app.is_operational(),
        }),
        ApiError::Store(StoreError::Cast { path, value, kind }) => json!({
            "name": error.name(),
            "path": path,
            "value": value,
            "kind": kind,
        }),
        ApiError::Store(StoreError::DuplicateKey { field, value }) => json!({
            "name": error.name(),
            "keyValue": { field.as_str(): value },
        }),
        ApiError::Store(StoreError::Validation(messages)) => json!({
            "name": error.name(),
            "errors": messages,
        }),
        ApiError::Store(StoreError::Database(source)) => json!({
            "name": error.name(),
            "source": format!("{source:?}"),
        }),
        ApiError::Token(_) => json!({ "name": error.name() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, middleware, routing::get};
    use axum_test::TestServer;

    async fn missing() -> Result<&'static str, ApiError> {
        Err(AppError::not_found("No tour found with the given ID: 42").into())
    }

    async fn bad_id() -> Result<&'static str, ApiError> {
        Err(StoreError::cast("id", "abc", "Number").into())
    }

    async fn duplicate() -> Result<&'static str, ApiError> {
        Err(StoreError::DuplicateKey {
            field: "name".to_string(),
            value: "The Forest Hiker".to_string(),
        }
        .into())
    }

    async fn database() -> Result<&'static str, ApiError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut).into())
    }

    async fn ok() -> Result<&'static str, ApiError> {
        Ok("fine")
    }

    fn server(environment: Environment) -> TestServer {
        let app = Router::new()
            .route("/missing", get(missing))
            .route("/bad-id", get(bad_id))
            .route("/duplicate", get(duplicate))
            .route("/database", get(database))
            .route("/ok", get(ok))
            .layer(middleware::from_fn_with_state(environment, layer));

        TestServer::new(app).unwrap()
    }

    #[test]
    fn test_normalize_messages() {
        let cast = normalize(&StoreError::cast("id", "abc", "Number").into());
        assert_eq!(cast.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(cast.message(), "Invalid input. id: abc");

        let validation = normalize(
            &StoreError::Validation(vec![
                "A tour must have a name".to_string(),
                "Rating must be between 1.0 and 5.0".to_string(),
            ])
            .into(),
        );
        assert_eq!(
            validation.message(),
            "Invalid inputs. Errors: A tour must have a name. Rating must be between 1.0 and 5.0"
        );

        let expired = normalize(&TokenError::Expired.into());
        assert_eq!(expired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(expired.message(), "Your token has expired. Please login again");

        let malformed = normalize(&TokenError::Malformed.into());
        assert_eq!(malformed.message(), "Invalid token. Please login again");
    }

    #[test]
    fn test_normalize_database_error_is_not_operational() {
        let error = normalize(&StoreError::Database(sqlx::Error::PoolTimedOut).into());
        assert!(!error.is_operational());
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_production_operational_error() {
        let response = server(Environment::Production).get("/missing").await;

        response.assert_status_not_found();
        let body = response.json::<Value>();
        assert_eq!(
            body,
            json!({ "status": "fail", "message": "No tour found with the given ID: 42" })
        );
    }

    #[tokio::test]
    async fn test_production_cast_error() {
        let response = server(Environment::Production).get("/bad-id").await;

        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert_eq!(body["message"], "Invalid input. id: abc");
        assert!(body.get("stack").is_none());
    }

    #[tokio::test]
    async fn test_production_duplicate_key() {
        let response = server(Environment::Production).get("/duplicate").await;

        response.assert_status_bad_request();
        assert_eq!(
            response.json::<Value>()["message"],
            "Duplicate field value. Value 'The Forest Hiker' already exists for 'name'"
        );
    }

    #[tokio::test]
    async fn test_production_hides_unknown_errors() {
        let response = server(Environment::Production).get("/database").await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.json::<Value>(),
            json!({ "status": "error", "message": GENERIC_MESSAGE })
        );
    }

    #[tokio::test]
    async fn test_development_includes_stack() {
        let response = server(Environment::Development).get("/missing").await;

        response.assert_status_not_found();
        let body = response.json::<Value>();
        assert_eq!(body["status"], "fail");
        assert_eq!(body["message"], "No tour found with the given ID: 42");
        assert_eq!(body["error"]["name"], "AppError");
        assert!(body["stack"].as_str().unwrap().starts_with("AppError: "));
    }

    #[tokio::test]
    async fn test_development_does_not_normalize() {
        let response = server(Environment::Development).get("/bad-id").await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.json::<Value>();
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"]["name"], "CastError");
        assert_eq!(body["error"]["path"], "id");
        assert!(body.get("stack").is_some());
    }

    #[tokio::test]
    async fn test_successful_responses_pass_through() {
        let response = server(Environment::Production).get("/ok").await;

        response.assert_status_ok();
        response.assert_text("fine");
    }
}
