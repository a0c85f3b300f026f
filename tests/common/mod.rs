use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use bank_ledger_api::{
    config::AppConfig,
    db::{self, DbConfig},
    seed, AppState,
};
use serde_json::Value;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

/// Helper harness for spinning up the router over a seeded in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            3001,
            "test".to_string(),
        );

        let pool = db::establish_connection_with_config(&DbConfig::single_connection(
            cfg.database_url(),
        ))
        .await
        .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        seed::seed_accounts(&pool)
            .await
            .expect("failed to seed accounts");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = bank_ledger_api::build_router(state.clone(), CorsLayer::permissive());

        Self { router, state }
    }

    /// Issue a request against the router, with an optional JSON body.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        self.send(builder.body(body).expect("failed to build request"))
            .await
    }

    /// Issue a pre-built request, for raw bodies and custom headers.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
