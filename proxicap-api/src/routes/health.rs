//! Health Check Endpoints
//!
//! - /health/ping - Simple liveness check
//! - /health/live - Process alive check
//! - /health/ready - Relay state summary
//!
//! The relay has no hard dependencies: upstream failures degrade to
//! placeholder addresses, so readiness is either healthy or degraded.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use proxicap_core::Timestamp;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDetails {
    pub version: String,
    pub uptime_seconds: u64,
    pub guard_mode: String,
    pub notifications_enabled: bool,
    pub geocode_cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_ingest_at: Option<Timestamp>,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health/ping - Simple pong response
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

/// GET /health/live - Process liveness check
pub async fn liveness() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("Process is alive".to_string()),
        details: None,
    };
    (StatusCode::OK, Json(response))
}

/// GET /health/ready - Readiness check
///
/// Reports `degraded` while notifications are switched off.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let notifications_enabled = state.notifier.is_some();
    let details = HealthDetails {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        guard_mode: state.geocode_cache.mode().to_string(),
        notifications_enabled,
        geocode_cached: state.geocode_cache.has_address(),
        last_ingest_at: state.store.last_received_at(),
    };

    let (status, message) = if notifications_enabled {
        (HealthStatus::Healthy, "Relay is ready")
    } else {
        (HealthStatus::Degraded, "Relay is ready; fall alert notifications are disabled")
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status,
            message: Some(message.to_string()),
            details: Some(details),
        }),
    )
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&HealthStatus::Healthy)?, "\"healthy\"");
        assert_eq!(serde_json::to_string(&HealthStatus::Degraded)?, "\"degraded\"");
        Ok(())
    }

    #[test]
    fn test_details_skip_missing_ingest_time() -> Result<(), serde_json::Error> {
        let details = HealthDetails {
            version: "0.1.0".to_string(),
            uptime_seconds: 5,
            guard_mode: "guarded".to_string(),
            notifications_enabled: true,
            geocode_cached: false,
            last_ingest_at: None,
        };
        let json = serde_json::to_value(details)?;
        assert!(json.get("last_ingest_at").is_none());
        Ok(())
    }
}
