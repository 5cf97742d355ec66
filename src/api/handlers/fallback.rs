//! Handler for requests no route matches.

use axum::http::Uri;

use crate::error::{ApiError, AppError};

/// Answers unknown paths with a 404 through the error channel.
pub async fn not_found_handler(uri: Uri) -> ApiError {
    let target = uri
        .path_and_query()
        .map(|path_and_query| path_and_query.as_str())
        .unwrap_or_else(|| uri.path());

    AppError::not_found(format!("Can't find the {target} on the server")).into()
}
