//! ProxiCap Telemetry - Observability Infrastructure
//!
//! Structured logging through `tracing` and Prometheus metrics for the relay.

pub mod metrics;
pub mod middleware;
pub mod tracer;

pub use metrics::{metrics_handler, ProxiCapMetrics, METRICS};
pub use middleware::observability_middleware;
pub use tracer::{init_tracer, LogFormat, TelemetryConfig};
