//! HTTP routes
//!
//! - `/update` and its Netlify alias: device ingest and dashboard read
//! - `/health/*`: liveness and readiness
//! - `/metrics`: Prometheus scrape endpoint
//!
//! Every response, including errors and unknown paths, carries the same
//! permissive CORS headers; the dashboard is served from another origin.

pub mod health;
pub mod update;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    middleware::from_fn,
    routing::get,
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::constants::{
    CORS_ALLOW_HEADERS, CORS_ALLOW_METHODS, CORS_ALLOW_ORIGIN, MAX_INGEST_BODY_BYTES,
    NETLIFY_UPDATE_PATH, UPDATE_PATH,
};
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

/// Build the relay router over `state`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(UPDATE_PATH, update::method_router())
        .route(NETLIFY_UPDATE_PATH, update::method_router())
        .nest("/health", health::create_router())
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_INGEST_BODY_BYTES))
        .layer(from_fn(observability_middleware))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(CORS_ALLOW_ORIGIN),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(CORS_ALLOW_METHODS),
        ))
}
