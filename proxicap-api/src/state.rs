//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use proxicap_core::{AlertNotifier, Clock, ReverseGeocoder, SystemClock};
use proxicap_providers::{EmailJsNotifier, NominatimGeocoder};
use proxicap_storage::{AlertGate, GeocodeCache, TelemetryStore};

use crate::config::RelayConfig;
use crate::error::ApiResult;

/// Process-lifetime state shared by every request.
///
/// The three singletons live exactly as long as the process. A restart
/// resets the geocode cache, the alert debouncer and the latest snapshot.
#[derive(Clone)]
pub struct AppState {
    pub geocode_cache: Arc<GeocodeCache>,
    pub alert_gate: Arc<AlertGate>,
    pub store: Arc<TelemetryStore>,
    /// `None` when notifications are switched off.
    pub notifier: Option<Arc<dyn AlertNotifier>>,
    pub clock: Arc<dyn Clock>,
    pub expose_alert_debug: bool,
    pub start_time: Instant,
}

impl AppState {
    /// Wire state from explicit collaborators.
    pub fn new(
        config: &RelayConfig,
        geocoder: Arc<dyn ReverseGeocoder>,
        notifier: Arc<dyn AlertNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mode = config.alert.guard_mode;
        Self {
            geocode_cache: Arc::new(GeocodeCache::new(geocoder, config.geocode.policy(), mode)),
            alert_gate: Arc::new(AlertGate::new(config.alert.cooldown_ms, mode)),
            store: Arc::new(TelemetryStore::new()),
            notifier: config.notifier.enabled.then_some(notifier),
            clock,
            expose_alert_debug: config.alert.expose_debug,
            start_time: Instant::now(),
        }
    }

    /// Wire state against the real Nominatim and EmailJS clients.
    pub fn from_config(config: &RelayConfig) -> ApiResult<Self> {
        let geocoder = Arc::new(NominatimGeocoder::new(&config.geocode.nominatim)?);
        let notifier = Arc::new(EmailJsNotifier::new(config.notifier.emailjs.clone())?);
        Ok(Self::new(config, geocoder, notifier, Arc::new(SystemClock)))
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("geocode_cache", &self.geocode_cache)
            .field("alert_gate", &self.alert_gate)
            .field(
                "notifier",
                &self.notifier.as_ref().map(|n| n.provider_id().to_string()),
            )
            .field("expose_alert_debug", &self.expose_alert_debug)
            .finish()
    }
}
