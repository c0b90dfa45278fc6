//! Upstream provider implementations
//!
//! Concrete `reqwest` clients behind the [`ReverseGeocoder`] and
//! [`AlertNotifier`] traits from `proxicap-core`.
//!
//! [`ReverseGeocoder`]: proxicap_core::ReverseGeocoder
//! [`AlertNotifier`]: proxicap_core::AlertNotifier

pub mod emailjs;
pub mod nominatim;

pub use emailjs::{EmailJsConfig, EmailJsNotifier, EmailJsRequest, TemplateParams};
pub use nominatim::{NominatimConfig, NominatimGeocoder};

use proxicap_core::ConfigError;

/// Build an HTTP client, mapping builder failures to a config error.
pub(crate) fn build_client(
    builder: reqwest::ClientBuilder,
    field: &str,
) -> Result<reqwest::Client, ConfigError> {
    builder.build().map_err(|e| ConfigError::InvalidValue {
        field: field.to_string(),
        value: String::new(),
        reason: format!("HTTP client construction failed: {}", e),
    })
}
