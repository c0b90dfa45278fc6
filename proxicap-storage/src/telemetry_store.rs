//! Latest-reading store.

use std::sync::{PoisonError, RwLock};

use proxicap_core::{RedactedSnapshot, TelemetrySnapshot, Timestamp};

/// Holds the most recent snapshot. No history is kept.
#[derive(Debug, Default)]
pub struct TelemetryStore {
    latest: RwLock<Option<TelemetrySnapshot>>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored snapshot wholesale.
    pub fn update(&self, snapshot: TelemetrySnapshot) {
        let mut latest = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        *latest = Some(snapshot);
    }

    /// Coordinate-free copy of the latest snapshot.
    pub fn read(&self) -> Option<RedactedSnapshot> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(TelemetrySnapshot::redact)
    }

    pub fn last_received_at(&self) -> Option<Timestamp> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|snapshot| snapshot.received_at)
    }
}
