//! Reverse-geocode policy: the free-tier protector and the place-name extractor.
//!
//! The Nominatim free tier bans clients that poll too often. A wearer who is
//! standing still keeps producing the same coordinates every few seconds, so
//! a lookup only happens once the device has moved past a small threshold.
//!
//! # Place-name priority
//!
//! ```text
//! landmark (amenity, mall, university, ...)   "Kingsway Mall"
//!   └─ else house_number + road                "101 Main St"
//!        └─ else road                          "Main St"
//!             └─ else first display_name part  "Edmonton"
//!                  └─ else                     "Unknown Location"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::GeocodeError;

// ============================================================================
// PLACEHOLDERS
// ============================================================================

/// Returned while the device has no GPS fix.
pub const SEARCHING_FOR_GPS: &str = "Searching for GPS signal...";

/// Returned when a successful lookup yields nothing usable.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Returned on a non-200 upstream answer or an exhausted local quota.
pub const GEOCODE_LIMIT_REACHED: &str = "Geocoding API Limit Reached";

/// Returned when the upstream body cannot be parsed.
pub const ADDRESS_PARSING_ERROR: &str = "Address Parsing Error";

/// Returned when the upstream cannot be reached.
pub const NETWORK_ERROR_ADDRESS: &str = "Network Error getting address";

/// Roughly 50 metres of latitude.
pub const DEFAULT_MOVEMENT_THRESHOLD_DEG: f64 = 0.0005;

// ============================================================================
// CACHE ENTRY
// ============================================================================

/// Last successfully resolved geocode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub address: String,
    pub lat: f64,
    pub lon: f64,
}

// ============================================================================
// POLICY
// ============================================================================

/// Decides when an upstream lookup is warranted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeocodePolicy {
    pub movement_threshold_deg: f64,
}

impl Default for GeocodePolicy {
    fn default() -> Self {
        Self {
            movement_threshold_deg: DEFAULT_MOVEMENT_THRESHOLD_DEG,
        }
    }
}

impl GeocodePolicy {
    pub fn new(movement_threshold_deg: f64) -> Self {
        Self {
            movement_threshold_deg,
        }
    }

    /// Coordinates usable for a lookup, or `None` when the device has no fix.
    ///
    /// A missing or zero component means no fix.
    pub fn fix(&self, lat: Option<f64>, lon: Option<f64>) -> Option<(f64, f64)> {
        match (lat, lon) {
            (Some(lat), Some(lon)) if lat != 0.0 && lon != 0.0 => Some((lat, lon)),
            _ => None,
        }
    }

    /// Cached address to reuse for `(lat, lon)`, if the wearer has not moved.
    pub fn reusable<'a>(
        &self,
        cached: Option<&'a CacheEntry>,
        lat: f64,
        lon: f64,
    ) -> Option<&'a str> {
        let entry = cached?;
        let moved_lat = (lat - entry.lat).abs();
        let moved_lon = (lon - entry.lon).abs();
        if moved_lat < self.movement_threshold_deg && moved_lon < self.movement_threshold_deg {
            Some(entry.address.as_str())
        } else {
            None
        }
    }
}

// ============================================================================
// OUTCOME
// ============================================================================

/// Result of resolving one reading's coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    /// No GPS fix; nothing was looked up.
    NoFix,
    /// Reused the cached address.
    Cached(String),
    /// Fresh upstream lookup; the cache now holds this address.
    Resolved(String),
    /// Lookup failed; the cache was left alone.
    Unavailable(GeocodeError),
}

impl GeocodeOutcome {
    /// Address string to show for this outcome.
    pub fn address(&self) -> &str {
        match self {
            GeocodeOutcome::NoFix => SEARCHING_FOR_GPS,
            GeocodeOutcome::Cached(address) | GeocodeOutcome::Resolved(address) => address,
            GeocodeOutcome::Unavailable(err) => err.placeholder(),
        }
    }

    /// Label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            GeocodeOutcome::NoFix => "no_fix",
            GeocodeOutcome::Cached(_) => "cache_hit",
            GeocodeOutcome::Resolved(_) => "resolved",
            GeocodeOutcome::Unavailable(err) => err.kind(),
        }
    }
}

// ============================================================================
// UPSTREAM RESPONSE
// ============================================================================

/// Structured address components (Nominatim `addressdetails=1`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressDetails {
    #[serde(default, deserialize_with = "lenient_text")]
    pub amenity: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub mall: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub university: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub college: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub building: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub shop: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub hospital: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub leisure: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub office: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub house_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub road: Option<String>,
}

impl AddressDetails {
    /// First non-empty landmark, in priority order.
    pub fn landmark(&self) -> Option<&str> {
        [
            &self.amenity,
            &self.mall,
            &self.university,
            &self.college,
            &self.building,
            &self.shop,
            &self.hospital,
            &self.leisure,
            &self.office,
        ]
        .into_iter()
        .find_map(non_empty)
    }

    /// `"{house_number} {road}"`, or just the road.
    pub fn street(&self) -> Option<String> {
        match (non_empty(&self.house_number), non_empty(&self.road)) {
            (Some(number), Some(road)) => Some(format!("{} {}", number, road)),
            (None, Some(road)) => Some(road.to_string()),
            _ => None,
        }
    }
}

/// Body of a successful reverse-geocode lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReverseGeocodeResponse {
    pub display_name: Option<String>,
    pub address: Option<AddressDetails>,
}

impl ReverseGeocodeResponse {
    /// Parse a 200 response body.
    pub fn from_json(body: &str) -> Result<Self, GeocodeError> {
        serde_json::from_str(body).map_err(|e| GeocodeError::Parse {
            reason: e.to_string(),
        })
    }

    /// Short human-readable place name. Never empty.
    pub fn place_name(&self) -> String {
        let from_details = self
            .address
            .as_ref()
            .and_then(|a| a.landmark().map(str::to_string).or_else(|| a.street()));

        from_details
            .or_else(|| self.display_head())
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
    }

    fn display_head(&self) -> Option<String> {
        let display = self.display_name.as_deref()?;
        let head = display.split(',').next().unwrap_or_default().trim();
        if head.is_empty() {
            None
        } else {
            Some(head.to_string())
        }
    }
}

/// Accept strings or numbers (some mirrors emit numeric house numbers).
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) => Some(text),
        Some(serde_json::Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
