//! Axum Middleware for HTTP Request Tracing and Metrics

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::metrics::with_metrics;
use crate::constants::{NETLIFY_UPDATE_PATH, UPDATE_PATH};

const KNOWN_PATHS: &[&str] = &[
    UPDATE_PATH,
    NETLIFY_UPDATE_PATH,
    "/health/ping",
    "/health/live",
    "/health/ready",
    "/metrics",
];

/// Collapse unknown paths into one label so scanners cannot blow up metric
/// cardinality.
fn normalize_path(path: &str) -> &'static str {
    let trimmed = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    KNOWN_PATHS
        .iter()
        .copied()
        .find(|known| *known == trimmed)
        .unwrap_or("other")
}

/// Observability middleware for Axum.
///
/// Wraps every request in an `http_request` span tagged with a fresh
/// request id, records Prometheus metrics and logs completion.
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = normalize_path(&path);

    let span = info_span!(
        "http_request",
        request_id = %Uuid::now_v7(),
        http.method = %method,
        http.target = %path,
        http.route = route,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    let status = response.status();

    with_metrics(|m| {
        m.record_http_request(method.as_str(), route, status.as_u16(), duration.as_secs_f64())
    });

    tracing::info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = duration.as_millis() as u64,
        "Request completed"
    );

    response
}
