//! Telemetry endpoint
//!
//! - `POST`: ingest one device reading
//! - `GET`: latest reading for the dashboard, without coordinates
//! - `OPTIONS`: CORS preflight
//!
//! Any other method, `HEAD` included, gets `405 Method Not Allowed`.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::services::ingest;
use crate::state::AppState;
use crate::telemetry::metrics::with_metrics;

/// Acknowledgement returned to the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestAck {
    pub status: String,
}

impl IngestAck {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// POST - ingest a reading
///
/// The body is read raw so a missing or wrong `Content-Type` from the
/// firmware does not matter. A body that cannot be buffered (over the size
/// limit, or cut off mid-stream) is answered like any other malformed payload.
pub async fn post_update(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<IngestAck>> {
    let body = body.map_err(|rejection| {
        tracing::warn!(
            status = rejection.status().as_u16(),
            reason = %rejection.body_text(),
            "Ingest body could not be read"
        );
        with_metrics(|m| m.record_ingest("rejected"));
        ApiError::invalid_json(rejection.body_text())
    })?;
    let report = ingest(&state, &body).await?;
    tracing::debug!(
        address = report.address(),
        geocode = report.geocode.label(),
        notification = %report.notification,
        "Reading accepted"
    );
    Ok(Json(IngestAck::ok()))
}

/// GET - latest snapshot, or `{}` before the first ingest
pub async fn get_update(State(state): State<AppState>) -> Response {
    match state.store.read() {
        Some(snapshot) => Json(snapshot).into_response(),
        None => Json(serde_json::json!({})).into_response(),
    }
}

/// OPTIONS - preflight; CORS headers are added by the router
pub async fn options_update() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

/// Method router shared by `/update` and its Netlify alias.
pub fn method_router() -> MethodRouter<AppState> {
    // Without an explicit HEAD route axum would answer HEAD with the GET handler.
    get(get_update)
        .head(method_not_allowed)
        .post(post_update)
        .options(options_update)
        .fallback(method_not_allowed)
}
