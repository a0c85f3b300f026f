//! Bank Ledger API Library
//!
//! Accounts, cash transfers between them, and the HTTP surface that serves both.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod client;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod repositories;
pub mod seed;
pub mod services;
pub mod tracing;

use anyhow::bail;
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone());
        Self {
            db,
            config,
            services,
        }
    }
}

/// Routes mounted under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/accounts", handlers::accounts::account_routes())
        .nest("/transactions", handlers::transactions::transaction_routes())
}

/// Full application router with health probes, the API and HTTP middleware.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .nest("/health", handlers::health::health_routes())
        .nest("/api", api_routes())
        .layer(crate::tracing::configure_http_tracing())
        .layer(cors)
        // Outermost, so the trace span and every response see the request id
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}

/// Builds the CORS layer from configuration.
///
/// Explicit origins win; otherwise development (or the explicit override)
/// gets a permissive layer and anything else is refused.
pub fn cors_layer(cfg: &config::AppConfig) -> anyhow::Result<CorsLayer> {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .expose_headers([HeaderName::from_static(
                middleware_helpers::REQUEST_ID_HEADER,
            )]));
    }

    if cfg.should_allow_permissive_cors() {
        return Ok(CorsLayer::permissive());
    }

    bail!("Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true")
}
