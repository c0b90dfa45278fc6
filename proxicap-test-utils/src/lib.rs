//! ProxiCap Test Utilities
//!
//! Centralized test infrastructure for the ProxiCap workspace:
//! - Scripted mock geocoder and notifier
//! - A manually driven clock
//! - Nominatim response fixtures
//! - A local stub HTTP upstream for the real provider clients
//! - Proptest generators for coordinates and device payloads

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeZone;
use proptest::prelude::*;

pub mod stub_http;

pub use stub_http::{RecordedRequest, StubServer};

// Re-export core types for convenience
pub use proxicap_core::{
    AlertNotifier, CacheEntry, Clock, FallAlert, GeocodeError, GeocodeOutcome, NotificationError,
    NotificationReceipt, Reading, ReverseGeocodeResponse, ReverseGeocoder, Timestamp,
    ADDRESS_PARSING_ERROR, GEOCODE_LIMIT_REACHED, NETWORK_ERROR_ADDRESS, SEARCHING_FOR_GPS,
    UNKNOWN_LOCATION,
};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// MOCK GEOCODER
// ============================================================================

/// One scripted upstream answer.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedGeocode {
    /// HTTP 200 with this body.
    Body(String),
    /// Non-200 status.
    Status(u16),
    /// Connection failure or timeout.
    Transport(String),
    /// Local quota exhausted.
    Throttled,
}

/// Reverse geocoder that replays a script and counts calls.
///
/// Once the script runs out every call returns the fallback answer.
#[derive(Debug)]
pub struct MockGeocoder {
    script: Mutex<VecDeque<ScriptedGeocode>>,
    fallback: ScriptedGeocode,
    requests: Mutex<Vec<(f64, f64)>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockGeocoder {
    /// Every call answers 200 with `body`.
    pub fn always(body: impl Into<String>) -> Self {
        Self::scripted(Vec::new(), ScriptedGeocode::Body(body.into()))
    }

    /// Every call fails the same way.
    pub fn failing(answer: ScriptedGeocode) -> Self {
        Self::scripted(Vec::new(), answer)
    }

    pub fn scripted(script: Vec<ScriptedGeocode>, fallback: ScriptedGeocode) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Sleep before answering, to widen concurrency windows in tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(f64, f64)> {
        locked(&self.requests).clone()
    }
}

#[async_trait]
impl ReverseGeocoder for MockGeocoder {
    fn provider_id(&self) -> &str {
        "mock-geocoder"
    }

    async fn reverse(&self, lat: f64, lon: f64) -> Result<ReverseGeocodeResponse, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        locked(&self.requests).push((lat, lon));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let answer = locked(&self.script)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match answer {
            ScriptedGeocode::Body(body) => ReverseGeocodeResponse::from_json(&body),
            ScriptedGeocode::Status(status) => Err(GeocodeError::Status { status }),
            ScriptedGeocode::Transport(reason) => Err(GeocodeError::Transport { reason }),
            ScriptedGeocode::Throttled => Err(GeocodeError::Throttled {
                provider: self.provider_id().to_string(),
            }),
        }
    }
}

// ============================================================================
// MOCK NOTIFIER
// ============================================================================

/// Notifier that records every alert it is asked to send.
#[derive(Debug, Default)]
pub struct MockNotifier {
    delivered: Mutex<Vec<FallAlert>>,
    attempts: AtomicUsize,
    fail_with: Option<NotificationError>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delivery attempt fails with `error`.
    pub fn failing(error: NotificationError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Alerts that were delivered successfully.
    pub fn delivered(&self) -> Vec<FallAlert> {
        locked(&self.delivered).clone()
    }
}

#[async_trait]
impl AlertNotifier for MockNotifier {
    fn provider_id(&self) -> &str {
        "mock-notifier"
    }

    async fn notify(&self, alert: &FallAlert) -> Result<NotificationReceipt, NotificationError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.fail_with {
            return Err(error.clone());
        }
        locked(&self.delivered).push(alert.clone());
        Ok(NotificationReceipt {
            provider: self.provider_id().to_string(),
            status: 200,
            body: "OK".to_string(),
        })
    }
}

// ============================================================================
// CLOCK
// ============================================================================

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn starting_now() -> Self {
        Self::new(fixed_start())
    }

    pub fn advance_ms(&self, millis: i64) {
        let mut now = locked(&self.now);
        *now += chrono::Duration::milliseconds(millis);
    }

    pub fn set(&self, at: Timestamp) {
        *locked(&self.now) = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *locked(&self.now)
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// Fixed start instant for deterministic tests.
pub fn fixed_start() -> Timestamp {
    chrono::Utc
        .with_ymd_and_hms(2025, 2, 14, 18, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Kingsway Mall, NAIT's neighbour in north Edmonton.
pub const KINGSWAY_LAT: f64 = 53.5580;
pub const KINGSWAY_LON: f64 = -113.5040;

/// Nominatim answer inside Kingsway Mall.
pub fn kingsway_mall_body() -> String {
    serde_json::json!({
        "place_id": 123456,
        "lat": "53.5580",
        "lon": "-113.5040",
        "display_name": "Kingsway Mall, 109 Street NW, Edmonton, Alberta, T5G 3A6, Canada",
        "address": {
            "mall": "Kingsway Mall",
            "house_number": "1",
            "road": "Kingsway NW",
            "city": "Edmonton",
            "state": "Alberta",
            "country": "Canada"
        }
    })
    .to_string()
}

/// Nominatim answer for a plain street address.
pub fn main_street_body() -> String {
    serde_json::json!({
        "display_name": "101, Main St, Springfield",
        "address": {"house_number": "101", "road": "Main St", "city": "Springfield"}
    })
    .to_string()
}

/// Nominatim answer carrying only a display name.
pub fn display_only_body(display_name: &str) -> String {
    serde_json::json!({ "display_name": display_name }).to_string()
}

/// Device payload as the firmware posts it.
pub fn device_payload(status: &str, lat: Option<f64>, lon: Option<f64>) -> serde_json::Value {
    let mut body = serde_json::json!({ "status": status });
    if let Some(object) = body.as_object_mut() {
        if let Some(lat) = lat {
            object.insert("lat".to_string(), serde_json::json!(lat));
        }
        if let Some(lon) = lon {
            object.insert("lon".to_string(), serde_json::json!(lon));
        }
    }
    body
}

// ============================================================================
// GENERATORS
// ============================================================================

/// A coordinate with a GPS fix (both components non-zero).
pub fn arb_fix() -> impl Strategy<Value = (f64, f64)> {
    (
        prop_oneof![-80.0f64..-0.01, 0.01f64..80.0],
        prop_oneof![-179.0f64..-0.01, 0.01f64..179.0],
    )
}

/// Coordinates without a usable fix: missing or zero on at least one axis.
pub fn arb_no_fix() -> impl Strategy<Value = (Option<f64>, Option<f64>)> {
    let component = prop_oneof![Just(None), Just(Some(0.0)), (-80.0f64..80.0).prop_map(Some)];
    (component.clone(), component).prop_filter("must lack a fix", |(lat, lon)| {
        !matches!((lat, lon), (Some(a), Some(b)) if *a != 0.0 && *b != 0.0)
    })
}

/// Firmware status labels, falls and not.
pub fn arb_status_label() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Normal".to_string()),
        Just("Fall Alert!".to_string()),
        Just("Walking".to_string()),
        "[A-Za-z ]{0,12}",
    ]
}

/// A well-formed device payload, with optional extra telemetry fields.
pub fn arb_device_payload() -> impl Strategy<Value = serde_json::Value> {
    (
        arb_status_label(),
        proptest::option::of(-80.0f64..80.0),
        proptest::option::of(-179.0f64..179.0),
        proptest::option::of(0u64..100),
    )
        .prop_map(|(status, lat, lon, battery)| {
            let mut payload = device_payload(&status, lat, lon);
            if let (Some(battery), Some(object)) = (battery, payload.as_object_mut()) {
                object.insert("battery".to_string(), serde_json::json!(battery));
            }
            payload
        })
}

/// Bodies that are not a valid device payload.
pub fn arb_malformed_body() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("{".to_string()),
        Just("not json".to_string()),
        Just("[]".to_string()),
        Just("{}".to_string()),
        Just(r#"{"status": 1}"#.to_string()),
        Just(r#"{"status": "Normal", "lat": "north"}"#.to_string()),
        "\\{[a-z\":, ]{0,20}",
    ]
}
