//! Prometheus Metrics Definitions
//!
//! Exposes a /metrics endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds). Ingests that hit the geocoder or
/// the email provider sit in the upper half.
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0, 20.0,
];

/// Global metrics instance - initialized once on first use
pub static METRICS: Lazy<ApiResult<ProxiCapMetrics>> = Lazy::new(ProxiCapMetrics::new);

/// Container for all relay metrics.
#[derive(Clone)]
pub struct ProxiCapMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Ingest counter - labels: outcome (accepted/rejected)
    pub ingests_total: CounterVec,

    /// Geocode resolution counter - labels: outcome
    pub geocode_total: CounterVec,

    /// Alert counter - labels: outcome (sent/failed/disabled/suppressed)
    pub alerts_total: CounterVec,
}

fn registration_failed(name: &str, err: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, err))
}

impl ProxiCapMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "proxicap_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_failed("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "proxicap_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_failed("http_request_duration_seconds", e))?,

            ingests_total: register_counter_vec!(
                "proxicap_ingests_total",
                "Telemetry ingests by outcome",
                &["outcome"]
            )
            .map_err(|e| registration_failed("ingests_total", e))?,

            geocode_total: register_counter_vec!(
                "proxicap_geocode_total",
                "Geocode resolutions by outcome",
                &["outcome"]
            )
            .map_err(|e| registration_failed("geocode_total", e))?,

            alerts_total: register_counter_vec!(
                "proxicap_alerts_total",
                "Fall alert decisions by outcome",
                &["outcome"]
            )
            .map_err(|e| registration_failed("alerts_total", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    pub fn record_ingest(&self, outcome: &str) {
        self.ingests_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_geocode(&self, outcome: &str) {
        self.geocode_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_alert(&self, outcome: &str) {
        self.alerts_total.with_label_values(&[outcome]).inc();
    }
}

/// Run `f` against the global metrics, if they registered.
pub fn with_metrics(f: impl FnOnce(&ProxiCapMetrics)) {
    match METRICS.as_ref() {
        Ok(metrics) => f(metrics),
        Err(e) => tracing::debug!(error = %e, "Metrics unavailable"),
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
pub async fn metrics_handler() -> impl IntoResponse {
    // Make sure the relay's own families exist even before the first request.
    with_metrics(|_| {});

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
