//! Ingest Service
//!
//! One device reading goes through four steps, in order:
//! 1. parse the body into a [`Reading`]
//! 2. resolve coordinates to a place name through the geocode cache
//! 3. run the fall alert gate and, when it fires, notify
//! 4. replace the latest snapshot
//!
//! A malformed body stops at step 1 with nothing mutated. Geocode and
//! notification failures never fail the ingest.

use proxicap_core::{
    AlertDebug, AlertDecision, FallAlert, GeocodeOutcome, NotificationOutcome, Reading,
    TelemetrySnapshot, Timestamp,
};

use crate::error::ApiResult;
use crate::state::AppState;
use crate::telemetry::metrics::with_metrics;

/// What happened to one accepted reading.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub geocode: GeocodeOutcome,
    pub decision: AlertDecision,
    pub notification: NotificationOutcome,
}

impl IngestReport {
    pub fn address(&self) -> &str {
        self.geocode.address()
    }
}

/// Process one ingest body against the shared state.
///
/// # Errors
/// Returns `InvalidJson` if the body is not a valid device payload. State is
/// untouched in that case.
pub async fn ingest(state: &AppState, body: &[u8]) -> ApiResult<IngestReport> {
    let reading = match Reading::from_slice(body) {
        Ok(reading) => reading,
        Err(err) => {
            tracing::warn!(error = %err, body_len = body.len(), "Rejected ingest payload");
            with_metrics(|m| m.record_ingest("rejected"));
            return Err(err.into());
        }
    };

    let received_at = state.clock.now();
    tracing::debug!(
        status = %reading.status_label,
        lat = ?reading.lat,
        lon = ?reading.lon,
        "Ingesting reading"
    );

    let geocode = state.geocode_cache.resolve(reading.lat, reading.lon).await;
    with_metrics(|m| m.record_geocode(geocode.label()));

    let decision = state.alert_gate.evaluate(reading.is_falling(), received_at);
    let notification =
        dispatch_alert(state, &decision, &reading, geocode.address(), received_at).await;

    let mut snapshot = TelemetrySnapshot::new(reading, geocode.address(), received_at);
    if state.expose_alert_debug {
        snapshot = snapshot.with_alert_debug(AlertDebug::new(&decision, notification.clone()));
    }
    state.store.update(snapshot);
    with_metrics(|m| m.record_ingest("accepted"));

    Ok(IngestReport {
        geocode,
        decision,
        notification,
    })
}

/// Send the emergency notification if the gate fired. Never retried.
async fn dispatch_alert(
    state: &AppState,
    decision: &AlertDecision,
    reading: &Reading,
    address: &str,
    raised_at: Timestamp,
) -> NotificationOutcome {
    if decision.suppressed() {
        tracing::info!(
            cooldown_remaining_ms = decision.cooldown_remaining_ms,
            "Fall rising edge inside cooldown, alert suppressed"
        );
        with_metrics(|m| m.record_alert("suppressed"));
        return NotificationOutcome::Skipped;
    }
    if !decision.should_alert() {
        return NotificationOutcome::Skipped;
    }

    let Some(notifier) = state.notifier.as_ref() else {
        tracing::warn!(address, "Fall detected but notifications are disabled");
        with_metrics(|m| m.record_alert("disabled"));
        return NotificationOutcome::Disabled;
    };

    let alert = FallAlert::new(address, reading.lat, reading.lon, raised_at);
    let result = notifier.notify(&alert).await;
    let outcome = NotificationOutcome::from_result(&result);

    match &result {
        Ok(receipt) => tracing::info!(
            alert_id = %alert.alert_id,
            provider = notifier.provider_id(),
            status = receipt.status,
            body = %receipt.body,
            address,
            "Fall alert sent"
        ),
        Err(err) => tracing::error!(
            alert_id = %alert.alert_id,
            provider = notifier.provider_id(),
            error = %err,
            address,
            "Fall alert notification failed"
        ),
    }
    with_metrics(|m| m.record_alert(outcome.label()));

    outcome
}
