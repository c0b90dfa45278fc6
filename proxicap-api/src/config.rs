//! Relay Configuration Module
//!
//! All settings come from environment variables with defaults suitable for
//! local development. Unset variables fall back to the default; a variable
//! that is set but unparseable is a startup error.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use proxicap_core::{
    ConfigError, GeocodePolicy, DEFAULT_ALERT_COOLDOWN_MS, DEFAULT_MOVEMENT_THRESHOLD_DEG,
};
use proxicap_providers::{EmailJsConfig, NominatimConfig};
use proxicap_storage::GuardMode;
use secrecy::SecretString;

use crate::constants::{
    DEFAULT_BIND_HOST, DEFAULT_EMAIL_TIMEOUT_SECS, DEFAULT_GEOCODE_TIMEOUT_SECS, DEFAULT_PORT,
};
use crate::telemetry::TelemetryConfig;

/// Source of configuration values, keyed by variable name.
pub(crate) type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

pub(crate) fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse an optional variable, keeping `default` when it is unset or blank.
pub(crate) fn parse_or<T>(lookup: Lookup<'_>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            field: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

/// Parse a boolean flag: `true/false`, `1/0`, `yes/no`, `on/off`.
pub(crate) fn flag_or(lookup: Lookup<'_>, key: &str, default: bool) -> Result<bool, ConfigError> {
    match lookup(key).map(|v| v.trim().to_lowercase()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                field: key.to_string(),
                value: v,
                reason: "expected true or false".to_string(),
            }),
        },
    }
}

fn string_or(lookup: Lookup<'_>, key: &str, default: String) -> String {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

// ============================================================================
// SERVER
// ============================================================================

/// Listen address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BIND_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Environment variables:
    /// - `PROXICAP_API_BIND`: host to bind (default: 0.0.0.0)
    /// - `PORT`, then `PROXICAP_API_PORT`: port (default: 3000)
    fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let host = string_or(lookup, "PROXICAP_API_BIND", DEFAULT_BIND_HOST.to_string());
        let port_key = if lookup("PORT").is_some() {
            "PORT"
        } else {
            "PROXICAP_API_PORT"
        };
        let port = parse_or(lookup, port_key, DEFAULT_PORT)?;
        Ok(Self { host, port })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "PROXICAP_API_BIND".to_string(),
                value: addr.clone(),
                reason: e.to_string(),
            })
    }
}

// ============================================================================
// GEOCODE
// ============================================================================

/// Reverse-geocoding client and cache policy.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeConfig {
    pub nominatim: NominatimConfig,
    /// Per-axis distance, in degrees, inside which the cached address is reused.
    pub movement_threshold_deg: f64,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            nominatim: NominatimConfig::default(),
            movement_threshold_deg: DEFAULT_MOVEMENT_THRESHOLD_DEG,
        }
    }
}

impl GeocodeConfig {
    /// Environment variables:
    /// - `PROXICAP_NOMINATIM_URL`: Nominatim instance root
    /// - `PROXICAP_GEOCODE_USER_AGENT`: User-Agent sent upstream
    /// - `PROXICAP_GEOCODE_TIMEOUT_SECS`: request timeout (default: 10)
    /// - `PROXICAP_GEOCODE_MOVEMENT_THRESHOLD_DEG`: cache radius (default: 0.0005)
    /// - `PROXICAP_GEOCODE_RATE_PER_SEC`: local quota (default: 1)
    fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let defaults = NominatimConfig::default();
        let timeout_secs = parse_or(
            lookup,
            "PROXICAP_GEOCODE_TIMEOUT_SECS",
            DEFAULT_GEOCODE_TIMEOUT_SECS,
        )?;
        let movement_threshold_deg = parse_or(
            lookup,
            "PROXICAP_GEOCODE_MOVEMENT_THRESHOLD_DEG",
            DEFAULT_MOVEMENT_THRESHOLD_DEG,
        )?;
        if !movement_threshold_deg.is_finite() || movement_threshold_deg < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "PROXICAP_GEOCODE_MOVEMENT_THRESHOLD_DEG".to_string(),
                value: movement_threshold_deg.to_string(),
                reason: "must be a non-negative number of degrees".to_string(),
            });
        }

        Ok(Self {
            nominatim: NominatimConfig {
                base_url: string_or(lookup, "PROXICAP_NOMINATIM_URL", defaults.base_url),
                user_agent: string_or(lookup, "PROXICAP_GEOCODE_USER_AGENT", defaults.user_agent),
                timeout: Duration::from_secs(timeout_secs),
                requests_per_second: parse_or(
                    lookup,
                    "PROXICAP_GEOCODE_RATE_PER_SEC",
                    defaults.requests_per_second,
                )?,
            },
            movement_threshold_deg,
        })
    }

    pub fn policy(&self) -> GeocodePolicy {
        GeocodePolicy::new(self.movement_threshold_deg)
    }
}

// ============================================================================
// NOTIFIER
// ============================================================================

/// Emergency email settings.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// When false, due alerts are recorded as `disabled` and nothing is sent.
    pub enabled: bool,
    pub emailjs: EmailJsConfig,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            emailjs: EmailJsConfig::default(),
        }
    }
}

impl NotifierConfig {
    /// Environment variables:
    /// - `PROXICAP_NOTIFICATIONS_ENABLED` (default: true)
    /// - `PROXICAP_EMAILJS_URL`, `PROXICAP_EMAILJS_SERVICE_ID`,
    ///   `PROXICAP_EMAILJS_TEMPLATE_ID`, `PROXICAP_EMAILJS_USER_ID`
    /// - `EMAILJS_PRIVATE_KEY`: access token, never logged
    /// - `PROXICAP_EMAIL_TIMEOUT_SECS` (default: 10)
    fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let defaults = EmailJsConfig::default();
        let timeout_secs =
            parse_or(lookup, "PROXICAP_EMAIL_TIMEOUT_SECS", DEFAULT_EMAIL_TIMEOUT_SECS)?;

        Ok(Self {
            enabled: flag_or(lookup, "PROXICAP_NOTIFICATIONS_ENABLED", true)?,
            emailjs: EmailJsConfig {
                base_url: string_or(lookup, "PROXICAP_EMAILJS_URL", defaults.base_url),
                service_id: string_or(lookup, "PROXICAP_EMAILJS_SERVICE_ID", defaults.service_id),
                template_id: string_or(
                    lookup,
                    "PROXICAP_EMAILJS_TEMPLATE_ID",
                    defaults.template_id,
                ),
                user_id: string_or(lookup, "PROXICAP_EMAILJS_USER_ID", defaults.user_id),
                access_token: lookup("EMAILJS_PRIVATE_KEY")
                    .filter(|key| !key.trim().is_empty())
                    .map(SecretString::from),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

// ============================================================================
// ALERT
// ============================================================================

/// Fall alert debouncing and shared-state policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertConfig {
    pub cooldown_ms: i64,
    pub guard_mode: GuardMode,
    /// Attach alert bookkeeping to the dashboard snapshot.
    pub expose_debug: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: DEFAULT_ALERT_COOLDOWN_MS,
            guard_mode: GuardMode::default(),
            expose_debug: false,
        }
    }
}

impl AlertConfig {
    /// Environment variables:
    /// - `PROXICAP_ALERT_COOLDOWN_MS` (default: 30000)
    /// - `PROXICAP_GUARD_MODE`: `guarded` or `racy` (default: guarded)
    /// - `PROXICAP_EXPOSE_ALERT_DEBUG` (default: false)
    fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let cooldown_ms =
            parse_or(lookup, "PROXICAP_ALERT_COOLDOWN_MS", DEFAULT_ALERT_COOLDOWN_MS)?;
        if cooldown_ms < 0 {
            return Err(ConfigError::InvalidValue {
                field: "PROXICAP_ALERT_COOLDOWN_MS".to_string(),
                value: cooldown_ms.to_string(),
                reason: "must not be negative".to_string(),
            });
        }

        Ok(Self {
            cooldown_ms,
            guard_mode: parse_or(lookup, "PROXICAP_GUARD_MODE", GuardMode::default())?,
            expose_debug: flag_or(lookup, "PROXICAP_EXPOSE_ALERT_DEBUG", false)?,
        })
    }
}

// ============================================================================
// RELAY CONFIGURATION
// ============================================================================

/// Complete relay configuration.
#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub geocode: GeocodeConfig,
    pub notifier: NotifierConfig,
    pub alert: AlertConfig,
    pub telemetry: TelemetryConfig,
}

impl RelayConfig {
    /// Load every section from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env_lookup)
    }

    pub(crate) fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_lookup(lookup)?,
            geocode: GeocodeConfig::from_lookup(lookup)?,
            notifier: NotifierConfig::from_lookup(lookup)?,
            alert: AlertConfig::from_lookup(lookup)?,
            telemetry: TelemetryConfig::from_lookup(lookup)?,
        })
    }

    /// Settings that work but are probably wrong for a production deploy.
    pub fn production_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.telemetry.is_production() {
            return warnings;
        }
        if self.notifier.enabled && !self.notifier.emailjs.has_access_token() {
            warnings.push(
                "EMAILJS_PRIVATE_KEY is not set; EmailJS will reject sends from a server"
                    .to_string(),
            );
        }
        if !self.notifier.enabled {
            warnings.push("Fall alert notifications are disabled".to_string());
        }
        if self.alert.guard_mode == GuardMode::Racy {
            warnings.push("PROXICAP_GUARD_MODE=racy can send duplicate fall alerts".to_string());
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() -> Result<(), ConfigError> {
        let config = RelayConfig::from_lookup(&lookup_from(&[]))?;
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.geocode, GeocodeConfig::default());
        assert_eq!(config.alert, AlertConfig::default());
        assert!(config.notifier.enabled);
        assert!(!config.notifier.emailjs.has_access_token());
        assert_eq!(config.geocode.nominatim.user_agent, "ProxiCap-Wearable/1.0");
        Ok(())
    }

    #[test]
    fn test_port_prefers_platform_variable() -> Result<(), ConfigError> {
        let config = ServerConfig::from_lookup(&lookup_from(&[
            ("PORT", "8888"),
            ("PROXICAP_API_PORT", "9999"),
        ]))?;
        assert_eq!(config.port, 8888);

        let config = ServerConfig::from_lookup(&lookup_from(&[("PROXICAP_API_PORT", "9999")]))?;
        assert_eq!(config.port, 9999);
        Ok(())
    }

    #[test]
    fn test_overrides_are_applied() -> Result<(), ConfigError> {
        let config = RelayConfig::from_lookup(&lookup_from(&[
            ("PROXICAP_NOMINATIM_URL", "http://nominatim.local"),
            ("PROXICAP_GEOCODE_MOVEMENT_THRESHOLD_DEG", "0.001"),
            ("PROXICAP_ALERT_COOLDOWN_MS", "5000"),
            ("PROXICAP_GUARD_MODE", "racy"),
            ("PROXICAP_EXPOSE_ALERT_DEBUG", "1"),
            ("PROXICAP_NOTIFICATIONS_ENABLED", "off"),
            ("EMAILJS_PRIVATE_KEY", "secret"),
        ]))?;
        assert_eq!(config.geocode.nominatim.base_url, "http://nominatim.local");
        assert_eq!(config.geocode.movement_threshold_deg, 0.001);
        assert_eq!(config.alert.cooldown_ms, 5000);
        assert_eq!(config.alert.guard_mode, GuardMode::Racy);
        assert!(config.alert.expose_debug);
        assert!(!config.notifier.enabled);
        assert!(config.notifier.emailjs.has_access_token());
        Ok(())
    }

    #[test]
    fn test_unparseable_values_are_errors() {
        for (key, value) in [
            ("PORT", "eighty"),
            ("PROXICAP_GUARD_MODE", "sometimes"),
            ("PROXICAP_ALERT_COOLDOWN_MS", "-1"),
            ("PROXICAP_GEOCODE_MOVEMENT_THRESHOLD_DEG", "-0.1"),
            ("PROXICAP_NOTIFICATIONS_ENABLED", "maybe"),
        ] {
            let result = RelayConfig::from_lookup(&lookup_from(&[(key, value)]));
            assert!(
                matches!(result, Err(ConfigError::InvalidValue { ref field, .. }) if field == key),
                "{} = {} should be rejected",
                key,
                value
            );
        }
    }

    #[test]
    fn test_socket_addr() {
        assert!(ServerConfig::default().socket_addr().is_ok());
        let bad = ServerConfig {
            host: "not a host".to_string(),
            port: 80,
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_production_warns_without_private_key() -> Result<(), ConfigError> {
        let config =
            RelayConfig::from_lookup(&lookup_from(&[("PROXICAP_ENVIRONMENT", "production")]))?;
        let warnings = config.production_warnings();
        assert!(warnings.iter().any(|w| w.contains("EMAILJS_PRIVATE_KEY")));

        let dev = RelayConfig::from_lookup(&lookup_from(&[]))?;
        assert!(dev.production_warnings().is_empty());
        Ok(())
    }
}
