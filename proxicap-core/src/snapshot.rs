//! Telemetry read model.
//!
//! [`TelemetrySnapshot`] is what the relay remembers about the latest
//! reading. [`RedactedSnapshot`] is what the public dashboard gets: it has no
//! coordinate fields at all, so exact GPS cannot leak through serialization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::alert::AlertDecision;
use crate::provider::NotificationOutcome;
use crate::reading::{DeviceTimestamp, FallStatus, Reading};
use crate::Timestamp;

/// Alert bookkeeping attached to a snapshot when debug output is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertDebug {
    pub rising_edge: bool,
    pub alert_fired: bool,
    pub cooldown_remaining_ms: i64,
    pub last_alert_at: Option<Timestamp>,
    pub notification: NotificationOutcome,
}

impl AlertDebug {
    pub fn new(decision: &AlertDecision, notification: NotificationOutcome) -> Self {
        Self {
            rising_edge: decision.rising_edge,
            alert_fired: decision.fire,
            cooldown_remaining_ms: decision.cooldown_remaining_ms,
            last_alert_at: decision.last_alert_at,
            notification,
        }
    }
}

/// Latest reading enriched with its resolved address.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    pub status: FallStatus,
    pub status_label: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timestamp: Option<DeviceTimestamp>,
    pub extra: Map<String, Value>,
    pub address: String,
    pub received_at: Timestamp,
    pub alert_debug: Option<AlertDebug>,
}

impl TelemetrySnapshot {
    pub fn new(reading: Reading, address: impl Into<String>, received_at: Timestamp) -> Self {
        Self {
            status: reading.status,
            status_label: reading.status_label,
            lat: reading.lat,
            lon: reading.lon,
            timestamp: reading.timestamp,
            extra: reading.extra,
            address: address.into(),
            received_at,
            alert_debug: None,
        }
    }

    pub fn with_alert_debug(mut self, debug: AlertDebug) -> Self {
        self.alert_debug = Some(debug);
        self
    }

    /// Copy without coordinates, safe to hand to untrusted readers.
    pub fn redact(&self) -> RedactedSnapshot {
        RedactedSnapshot {
            status: self.status_label.clone(),
            timestamp: self.timestamp.clone(),
            address: self.address.clone(),
            received_at: self.received_at,
            alert_debug: self.alert_debug.clone(),
            extra: self.extra.clone(),
        }
    }
}

/// Dashboard view of the latest reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactedSnapshot {
    /// Status label as sent by the device.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DeviceTimestamp>,
    pub address: String,
    pub received_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_debug: Option<AlertDebug>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_redacted_snapshot_has_no_coordinates() -> Result<(), serde_json::Error> {
        let mut reading = Reading::new("Fall Alert!", Some(53.57), Some(-113.50));
        reading
            .extra
            .insert("battery".to_string(), serde_json::json!(91));

        let snapshot = TelemetrySnapshot::new(reading, "NAIT", Utc::now());
        let json = serde_json::to_value(snapshot.redact())?;
        let object = json.as_object().cloned().unwrap_or_default();

        assert!(!object.contains_key("lat"));
        assert!(!object.contains_key("lon"));
        assert_eq!(object.get("status"), Some(&serde_json::json!("Fall Alert!")));
        assert_eq!(object.get("address"), Some(&serde_json::json!("NAIT")));
        assert_eq!(object.get("battery"), Some(&serde_json::json!(91)));
        assert!(!object.contains_key("alert_debug"));
        Ok(())
    }
}
