//! Constants for the ProxiCap API
//!
//! Provider defaults (Nominatim endpoint, EmailJS account ids) live with the
//! clients in `proxicap-providers`; alert and geocode policy defaults live in
//! `proxicap-core`.

// ============================================================================
// SERVER
// ============================================================================

/// Default bind host
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 3000;

/// Device-facing telemetry path
pub const UPDATE_PATH: &str = "/update";

/// Path the deployed firmware and dashboard were built against
pub const NETLIFY_UPDATE_PATH: &str = "/.netlify/functions/update";

// ============================================================================
// CORS
// ============================================================================

pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_HEADERS: &str = "Content-Type";
pub const CORS_ALLOW_METHODS: &str = "GET,POST,OPTIONS";

// ============================================================================
// DEVICE CONTRACT
// ============================================================================

/// Body of every 400 on the ingest path
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON";

/// Body of every 405 on the telemetry path
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method Not Allowed";

/// Largest ingest body accepted (the firmware sends well under 1 KiB)
pub const MAX_INGEST_BODY_BYTES: usize = 64 * 1024;

// ============================================================================
// PROVIDERS
// ============================================================================

/// Default timeout for the reverse-geocode request, in seconds
pub const DEFAULT_GEOCODE_TIMEOUT_SECS: u64 = 10;

/// Default timeout for the notification request, in seconds
pub const DEFAULT_EMAIL_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// TELEMETRY
// ============================================================================

/// Service name reported in logs
pub const DEFAULT_SERVICE_NAME: &str = "proxicap-api";

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str =
    "proxicap_api=debug,proxicap_storage=debug,proxicap_providers=debug,info";
