//! ProxiCap API - Telemetry Relay
//!
//! HTTP surface between the fall-detecting wearable and its dashboard.
//! The device POSTs readings to `/update`; each reading is reverse-geocoded
//! through a single-slot cache, run through the fall alert debouncer (which
//! may send an emergency email) and stored as the latest snapshot. The
//! dashboard polls `GET /update` for a coordinate-free copy of it.

pub mod config;
pub mod constants;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::{AlertConfig, GeocodeConfig, NotifierConfig, RelayConfig, ServerConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_router;
pub use services::{ingest, IngestReport};
pub use state::AppState;
pub use telemetry::TelemetryConfig;
