//! ProxiCap Storage - Shared Singleton State
//!
//! One device means one reading, one geocode cache slot and one alert state.
//! These live for the lifetime of a server instance and are lost on restart.
//!
//! Each component honours a [`GuardMode`]: `Guarded` runs every
//! read-evaluate-write in a single critical section, `Racy` splits it in two
//! and so admits lost updates (for example a double alert) under overlapping
//! ingests.

pub mod alert_gate;
pub mod geocode_cache;
pub mod guard;
pub mod telemetry_store;

pub use alert_gate::AlertGate;
pub use geocode_cache::GeocodeCache;
pub use guard::{GuardMode, GuardModeParseError};
pub use telemetry_store::TelemetryStore;
