//! ProxiCap Relay Server Entry Point
//!
//! Loads configuration from the environment, wires the Nominatim and EmailJS
//! clients into the shared state, and starts the Axum HTTP server.

use proxicap_api::telemetry::init_tracer;
use proxicap_api::{create_router, ApiError, ApiResult, AppState, RelayConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let config = RelayConfig::from_env()?;
    init_tracer(&config.telemetry)?;

    for warning in config.production_warnings() {
        tracing::warn!(warning = %warning, "Configuration warning");
    }

    let state = AppState::from_config(&config)?;
    tracing::info!(
        guard_mode = %config.alert.guard_mode,
        cooldown_ms = config.alert.cooldown_ms,
        movement_threshold_deg = config.geocode.movement_threshold_deg,
        notifications_enabled = config.notifier.enabled,
        nominatim = %config.geocode.nominatim.base_url,
        "Relay state initialized"
    );

    let app = create_router(state);

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "Starting ProxiCap relay");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
