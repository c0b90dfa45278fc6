//! Device reading as posted by the wearable.
//!
//! The firmware posts a flat JSON object. Only `status` is required; `lat`,
//! `lon` and `timestamp` are optional and every other key is carried through
//! untouched so the dashboard sees what the device sent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::IngestError;

/// Status label the firmware sends when its fall detector trips.
pub const FALL_ALERT_LABEL: &str = "Fall Alert!";

/// Keys owned by the relay. A device-supplied value for any of these is dropped.
const RESERVED_KEYS: &[&str] = &["address", "alert_debug", "received_at"];

// ============================================================================
// FALL STATUS
// ============================================================================

/// Whether the wearer is currently considered fallen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FallStatus {
    Normal,
    FallAlert,
}

impl FallStatus {
    /// Map a firmware status label onto a fall status.
    ///
    /// `"Fall Alert!"`, `"FallAlert"` and `"fall_alert"` (any case) are falls;
    /// everything else is treated as normal.
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        if trimmed == FALL_ALERT_LABEL
            || trimmed.eq_ignore_ascii_case("fallalert")
            || trimmed.eq_ignore_ascii_case("fall_alert")
        {
            FallStatus::FallAlert
        } else {
            FallStatus::Normal
        }
    }

    pub fn is_falling(&self) -> bool {
        matches!(self, FallStatus::FallAlert)
    }
}

impl fmt::Display for FallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// DEVICE TIMESTAMP
// ============================================================================

/// Timestamp as supplied by the device: usually `millis()` uptime, sometimes text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceTimestamp {
    Numeric(serde_json::Number),
    Text(String),
}

// ============================================================================
// READING
// ============================================================================

/// Wire shape of the ingest body before classification.
#[derive(Debug, Deserialize)]
struct RawReading {
    status: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    timestamp: Option<DeviceTimestamp>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// A single telemetry sample from the wearable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawReading")]
pub struct Reading {
    /// Classified status used by the alert debouncer.
    pub status: FallStatus,
    /// Status text exactly as the device sent it.
    pub status_label: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timestamp: Option<DeviceTimestamp>,
    /// Any additional fields the firmware included (battery, heart rate, ...).
    pub extra: Map<String, Value>,
}

impl From<RawReading> for Reading {
    fn from(raw: RawReading) -> Self {
        let mut extra = raw.extra;
        for key in RESERVED_KEYS {
            extra.remove(*key);
        }
        Self {
            status: FallStatus::from_label(&raw.status),
            status_label: raw.status,
            lat: raw.lat,
            lon: raw.lon,
            timestamp: raw.timestamp,
            extra,
        }
    }
}

impl Reading {
    /// Build a reading with just a status label and coordinates.
    pub fn new(status_label: impl Into<String>, lat: Option<f64>, lon: Option<f64>) -> Self {
        let status_label = status_label.into();
        Self {
            status: FallStatus::from_label(&status_label),
            status_label,
            lat,
            lon,
            timestamp: None,
            extra: Map::new(),
        }
    }

    /// Parse an ingest body. An empty body is read as `{}`.
    pub fn from_slice(body: &[u8]) -> Result<Self, IngestError> {
        let body = if body.iter().all(u8::is_ascii_whitespace) {
            b"{}".as_slice()
        } else {
            body
        };
        serde_json::from_slice(body).map_err(|e| IngestError::MalformedPayload {
            reason: e.to_string(),
        })
    }

    pub fn is_falling(&self) -> bool {
        self.status.is_falling()
    }
}
