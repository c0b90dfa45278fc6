//! Wall-clock abstraction so cooldown behaviour can be driven from tests.

use crate::Timestamp;

/// Source of "now" for alert evaluation and snapshot stamping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The real UTC clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now()
    }
}
