//! ProxiCap Core - Telemetry Types and Policies
//!
//! Pure data structures and decision logic shared by every other crate:
//! - `Reading` / `TelemetrySnapshot` for the device payload and its read model
//! - `geocode` for the free-tier protector and place-name extraction
//! - `alert` for fall rising-edge detection with a cooldown gate
//! - `provider` for the upstream geocoder / notifier traits
//!
//! Nothing in this crate performs I/O.

pub mod alert;
pub mod clock;
pub mod error;
pub mod geocode;
pub mod provider;
pub mod reading;
pub mod snapshot;

use chrono::{DateTime, Utc};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

pub use alert::{AlertDebouncer, AlertDecision, AlertState, DEFAULT_ALERT_COOLDOWN_MS};
pub use clock::{Clock, SystemClock};
pub use error::{ConfigError, GeocodeError, IngestError, NotificationError};
pub use geocode::{
    AddressDetails, CacheEntry, GeocodeOutcome, GeocodePolicy, ReverseGeocodeResponse,
    ADDRESS_PARSING_ERROR, DEFAULT_MOVEMENT_THRESHOLD_DEG, GEOCODE_LIMIT_REACHED,
    NETWORK_ERROR_ADDRESS, SEARCHING_FOR_GPS, UNKNOWN_LOCATION,
};
pub use provider::{
    AlertNotifier, FallAlert, NotificationOutcome, NotificationReceipt, ReverseGeocoder,
};
pub use reading::{DeviceTimestamp, FallStatus, Reading, FALL_ALERT_LABEL};
pub use snapshot::{AlertDebug, RedactedSnapshot, TelemetrySnapshot};
