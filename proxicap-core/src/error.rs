//! Error types for ProxiCap operations

use thiserror::Error;

/// Reverse-geocoding failures.
///
/// None of these ever reach the device: the geocode cache degrades each one
/// to a placeholder address (see [`GeocodeError::placeholder`]).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeocodeError {
    #[error("Geocoder answered with HTTP status {status}")]
    Status { status: u16 },

    #[error("Local quota for {provider} exhausted")]
    Throttled { provider: String },

    #[error("Geocoder response could not be parsed: {reason}")]
    Parse { reason: String },

    #[error("Geocoder request failed: {reason}")]
    Transport { reason: String },
}

impl GeocodeError {
    /// Placeholder address shown on the dashboard in place of a real one.
    pub fn placeholder(&self) -> &'static str {
        match self {
            GeocodeError::Status { .. } | GeocodeError::Throttled { .. } => {
                crate::geocode::GEOCODE_LIMIT_REACHED
            }
            GeocodeError::Parse { .. } => crate::geocode::ADDRESS_PARSING_ERROR,
            GeocodeError::Transport { .. } => crate::geocode::NETWORK_ERROR_ADDRESS,
        }
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GeocodeError::Status { .. } => "http_error",
            GeocodeError::Throttled { .. } => "throttled",
            GeocodeError::Parse { .. } => "parse_error",
            GeocodeError::Transport { .. } => "network_error",
        }
    }
}

/// Emergency notification failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotificationError {
    #[error("{provider} rejected the notification with status {status}: {body}")]
    Rejected {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Request to {provider} failed: {reason}")]
    Transport { provider: String, reason: String },

    #[error("Notifier is missing configuration field: {field}")]
    NotConfigured { field: String },
}

/// Ingest boundary errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("Malformed ingest payload: {reason}")]
    MalformedPayload { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

// =============================================================================
// TESTS
// =============================================================================
