use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;
use std::time::Instant;
use tracing::{debug, warn};

use crate::handlers::AppState;

/// Health probe; answers 503 when the ledger database does not respond
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    debug!("Health check endpoint called");

    let up = crate::db::check_connection(&state.db).await.is_ok();
    if !up {
        warn!("Health check failed: database unreachable");
    }
    let status = if up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if up { "up" } else { "down" },
            "version": env!("CARGO_PKG_VERSION"),
            "environment": state.config.environment,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

/// Readiness probe with per-dependency detail
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let db_result = crate::db::check_connection(&state.db).await;
    let db_latency = start.elapsed().as_millis() as u64;

    match db_result {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "checks": {
                    "database": { "status": "up", "latency_ms": db_latency }
                }
            })),
        ),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "checks": {
                    "database": { "status": "down", "error": err.to_string() }
                }
            })),
        ),
    }
}

/// Endpoints:
/// - GET /health       - status, version, database ping
/// - GET /health/ready - database connectivity with latency
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(readiness_check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use sea_orm::DatabaseConnection;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app_with(db: DatabaseConnection) -> Router {
        let cfg = AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            3001,
            "test".into(),
        );
        health_routes().with_state(AppState::new(Arc::new(db), cfg))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_is_unavailable_without_a_database() {
        let (status, body) = get(app_with(DatabaseConnection::Disconnected), "/").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "down");
        assert_eq!(body["environment"], "test");
    }

    #[tokio::test]
    async fn readiness_reports_the_failed_dependency() {
        let (status, body) = get(app_with(DatabaseConnection::Disconnected), "/ready").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["checks"]["database"]["status"], "down");
    }

    #[tokio::test]
    async fn health_is_up_with_a_live_database() {
        let pool = crate::db::establish_connection_with_config(
            &crate::db::DbConfig::single_connection("sqlite::memory:"),
        )
        .await
        .unwrap();

        let (status, body) = get(app_with(pool), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "up");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
