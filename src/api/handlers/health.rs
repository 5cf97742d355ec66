//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_check = check_database(&state).await;

    let all_healthy = db_check.status == "ok";

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks { database: db_check },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Checks database connectivity with a trivial query.
async fn check_database(state: &AppState) -> CheckStatus {
    match state.tour_service.ping().await {
        Ok(()) => CheckStatus {
            status: "ok".to_string(),
            message: Some("Connected".to_string()),
        },
        Err(e) => CheckStatus {
            status: "error".to_string(),
            message: Some(format!("Database error: {}", e)),
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::application::services::TourService;
    use crate::config::Environment;
    use crate::domain::repositories::MockTourRepository;
    use crate::error::StoreError;
    use crate::routes::app_router;
    use crate::state::AppState;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::Value;
    use std::sync::Arc;

    fn server(mock: MockTourRepository) -> TestServer {
        let service = TourService::new(Arc::new(mock), 1000);
        TestServer::new(app_router(AppState::new(Arc::new(service)), Environment::Production))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_ok() {
        let mut mock = MockTourRepository::new();
        mock.expect_ping().times(1).returning(|| Ok(()));

        let response = server(mock).get("/health").await;

        response.assert_status_ok();
        let json = response.json::<Value>();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["checks"]["database"]["status"], "ok");
    }

    #[tokio::test]
    async fn test_health_degraded() {
        let mut mock = MockTourRepository::new();
        mock.expect_ping()
            .times(1)
            .returning(|| Err(StoreError::Database(sqlx::Error::PoolTimedOut)));

        let response = server(mock).get("/health").await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.json::<Value>()["status"], "degraded");
    }
}
