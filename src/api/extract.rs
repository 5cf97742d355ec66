//! Extractors whose rejections go through the error channel.
//!
//! Axum's stock extractors answer bad input with their own plain-text
//! response. These wrappers turn the rejection into an [`ApiError`] so the
//! terminal error middleware renders it like any other failure.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};

use crate::error::{ApiError, AppError, StoreError};

/// [`axum::Json`] with rejections forwarded as [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// [`axum::extract::Query`] with rejections forwarded as [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// [`axum::extract::Path`] with rejections forwarded as [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// A well-formed body whose fields do not fit the target type is invalid
/// input; the message keeps the offending path, e.g.
/// `price: invalid type: string "abc", expected f64 at line 1 column 14`.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(error) => {
                let text = error.body_text();
                let detail = text
                    .split_once(": ")
                    .map_or(text.as_str(), |(_, detail)| detail);
                StoreError::Validation(vec![detail.to_string()]).into()
            }
            other => AppError::new(other.body_text(), other.status()).into(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::new(rejection.body_text(), rejection.status()).into()
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        AppError::new(rejection.body_text(), rejection.status()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::middleware::error_handler;
    use crate::config::Environment;
    use axum::{Router, middleware, routing::post};
    use axum_test::TestServer;
    use serde::Deserialize;
    use serde_json::{Value, json};

    #[derive(Deserialize)]
    struct Payload {
        name: String,
    }

    async fn echo(ApiJson(payload): ApiJson<Payload>) -> String {
        payload.name
    }

    fn server() -> TestServer {
        let app = Router::new().route("/", post(echo)).layer(middleware::from_fn_with_state(
            Environment::Production,
            error_handler::layer,
        ));
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_valid_json_is_extracted() {
        let response = server().post("/").json(&json!({ "name": "forest" })).await;

        response.assert_status_ok();
        response.assert_text("forest");
    }

    #[tokio::test]
    async fn test_missing_field_is_invalid_input() {
        let response = server().post("/").json(&json!({ "title": "forest" })).await;

        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert_eq!(body["status"], "fail");
        let message = body["message"].as_str().unwrap();
        assert!(message.starts_with("Invalid inputs. Errors: "), "{message}");
        assert!(message.contains("name"), "{message}");
    }

    #[tokio::test]
    async fn test_mistyped_field_names_its_path() {
        let response = server().post("/").json(&json!({ "name": 42 })).await;

        response.assert_status_bad_request();
        let message = response.json::<Value>()["message"].as_str().unwrap().to_string();
        assert!(message.starts_with("Invalid inputs. Errors: name: invalid type"), "{message}");
        assert!(!message.contains("Failed to deserialize"), "{message}");
    }

    #[tokio::test]
    async fn test_malformed_json_keeps_its_status() {
        let response = server()
            .post("/")
            .text("{not json")
            .content_type("application/json")
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["status"], "fail");
    }
}
