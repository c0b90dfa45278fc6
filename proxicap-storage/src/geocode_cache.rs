//! Single-slot reverse-geocode cache in front of the upstream geocoder.
//!
//! Only a successful lookup writes the slot. A failed lookup returns a
//! placeholder and leaves the last good address in place, so a transient
//! outage does not wipe what the dashboard shows once the device moves back
//! into range of the cached point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use proxicap_core::{CacheEntry, GeocodeOutcome, GeocodePolicy, ReverseGeocoder};
use tokio::sync::Mutex;

use crate::guard::GuardMode;

/// Reverse-geocode cache with the free-tier protector applied.
pub struct GeocodeCache {
    geocoder: Arc<dyn ReverseGeocoder>,
    policy: GeocodePolicy,
    mode: GuardMode,
    slot: Mutex<Option<CacheEntry>>,
    // Set once the slot first holds an address; readable without the lock.
    populated: AtomicBool,
}

impl GeocodeCache {
    pub fn new(geocoder: Arc<dyn ReverseGeocoder>, policy: GeocodePolicy, mode: GuardMode) -> Self {
        Self {
            geocoder,
            policy,
            mode,
            slot: Mutex::new(None),
            populated: AtomicBool::new(false),
        }
    }

    pub fn policy(&self) -> GeocodePolicy {
        self.policy
    }

    pub fn mode(&self) -> GuardMode {
        self.mode
    }

    /// Current cache slot. Waits behind an in-flight guarded lookup.
    pub async fn entry(&self) -> Option<CacheEntry> {
        self.slot.lock().await.clone()
    }

    /// Whether any address has been cached yet. Never waits on the slot lock.
    pub fn has_address(&self) -> bool {
        self.populated.load(Ordering::Acquire)
    }

    fn store(&self, slot: &mut Option<CacheEntry>, address: &str, lat: f64, lon: f64) {
        *slot = Some(CacheEntry {
            address: address.to_string(),
            lat,
            lon,
        });
        self.populated.store(true, Ordering::Release);
    }

    /// Resolve a reading's coordinates to a short place name.
    ///
    /// In `Guarded` mode the slot stays locked across the upstream call, so
    /// overlapping ingests for the same spot produce a single lookup.
    pub async fn resolve(&self, lat: Option<f64>, lon: Option<f64>) -> GeocodeOutcome {
        let Some((lat, lon)) = self.policy.fix(lat, lon) else {
            return GeocodeOutcome::NoFix;
        };

        match self.mode {
            GuardMode::Guarded => {
                let mut slot = self.slot.lock().await;
                if let Some(address) = self.policy.reusable(slot.as_ref(), lat, lon) {
                    return GeocodeOutcome::Cached(address.to_string());
                }
                let outcome = self.lookup(lat, lon).await;
                if let GeocodeOutcome::Resolved(address) = &outcome {
                    self.store(&mut slot, address, lat, lon);
                }
                outcome
            }
            GuardMode::Racy => {
                let observed = self.slot.lock().await.clone();
                if let Some(address) = self.policy.reusable(observed.as_ref(), lat, lon) {
                    return GeocodeOutcome::Cached(address.to_string());
                }
                let outcome = self.lookup(lat, lon).await;
                if let GeocodeOutcome::Resolved(address) = &outcome {
                    let mut slot = self.slot.lock().await;
                    self.store(&mut slot, address, lat, lon);
                }
                outcome
            }
        }
    }

    async fn lookup(&self, lat: f64, lon: f64) -> GeocodeOutcome {
        tracing::debug!(
            provider = self.geocoder.provider_id(),
            lat,
            lon,
            "Moved significantly, requesting reverse geocode"
        );

        match self.geocoder.reverse(lat, lon).await {
            Ok(response) => {
                let address = response.place_name();
                tracing::info!(address = %address, "Reverse geocode resolved");
                GeocodeOutcome::Resolved(address)
            }
            Err(err) => {
                tracing::warn!(
                    provider = self.geocoder.provider_id(),
                    error = %err,
                    "Reverse geocode failed, keeping previous cache entry"
                );
                GeocodeOutcome::Unavailable(err)
            }
        }
    }
}

impl std::fmt::Debug for GeocodeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodeCache")
            .field("provider", &self.geocoder.provider_id())
            .field("policy", &self.policy)
            .field("mode", &self.mode)
            .finish()
    }
}
