//! Upstream collaborator traits.
//!
//! The pure traits live here; the `reqwest` implementations are in
//! `proxicap-providers` and scripted mocks in `proxicap-test-utils`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{GeocodeError, NotificationError};
use crate::geocode::ReverseGeocodeResponse;
use crate::Timestamp;

// ============================================================================
// REVERSE GEOCODER
// ============================================================================

/// Reverse-geocoding service.
///
/// Implementations map a non-200 answer to [`GeocodeError::Status`], an
/// unparseable body to [`GeocodeError::Parse`] and connection problems or
/// timeouts to [`GeocodeError::Transport`].
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Provider identifier for logs and metrics.
    fn provider_id(&self) -> &str;

    /// Look up structured address details for a coordinate.
    async fn reverse(&self, lat: f64, lon: f64) -> Result<ReverseGeocodeResponse, GeocodeError>;
}

// ============================================================================
// ALERT NOTIFIER
// ============================================================================

/// Emergency notification raised on a debounced fall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallAlert {
    pub alert_id: Uuid,
    pub address: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub raised_at: Timestamp,
}

impl FallAlert {
    pub fn new(
        address: impl Into<String>,
        lat: Option<f64>,
        lon: Option<f64>,
        raised_at: Timestamp,
    ) -> Self {
        Self {
            alert_id: Uuid::now_v7(),
            address: address.into(),
            lat,
            lon,
            raised_at,
        }
    }
}

/// Upstream acknowledgement of a delivered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationReceipt {
    pub provider: String,
    pub status: u16,
    pub body: String,
}

/// Notification sink (transactional email, SMS, ...).
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    fn provider_id(&self) -> &str;

    /// Deliver one alert. Called at most once per alert; never retried.
    async fn notify(&self, alert: &FallAlert) -> Result<NotificationReceipt, NotificationError>;
}

/// What became of the notification for one ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NotificationOutcome {
    /// No alert was due.
    Skipped,
    /// An alert was due but notifications are switched off.
    Disabled,
    Sent { status: u16 },
    Failed { reason: String },
}

impl NotificationOutcome {
    pub fn from_result(result: &Result<NotificationReceipt, NotificationError>) -> Self {
        match result {
            Ok(receipt) => NotificationOutcome::Sent {
                status: receipt.status,
            },
            Err(err) => NotificationOutcome::Failed {
                reason: err.to_string(),
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NotificationOutcome::Skipped => "skipped",
            NotificationOutcome::Disabled => "disabled",
            NotificationOutcome::Sent { .. } => "sent",
            NotificationOutcome::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for NotificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_result() {
        let ok: Result<NotificationReceipt, NotificationError> = Ok(NotificationReceipt {
            provider: "emailjs".to_string(),
            status: 200,
            body: "OK".to_string(),
        });
        assert_eq!(
            NotificationOutcome::from_result(&ok),
            NotificationOutcome::Sent { status: 200 }
        );

        let err: Result<NotificationReceipt, NotificationError> =
            Err(NotificationError::Transport {
                provider: "emailjs".to_string(),
                reason: "timed out".to_string(),
            });
        let outcome = NotificationOutcome::from_result(&err);
        assert_eq!(outcome.label(), "failed");
    }

    #[test]
    fn test_outcome_serialization() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(NotificationOutcome::Sent { status: 200 })?;
        assert_eq!(json, serde_json::json!({"state": "sent", "status": 200}));
        Ok(())
    }
}
