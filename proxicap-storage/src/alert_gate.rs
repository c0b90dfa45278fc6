//! Shared alert debouncer state.

use std::sync::{Mutex, MutexGuard, PoisonError};

use proxicap_core::{AlertDebouncer, AlertDecision, AlertState, Timestamp};

use crate::guard::GuardMode;

/// The process-wide [`AlertDebouncer`] state behind a mutex.
#[derive(Debug)]
pub struct AlertGate {
    cooldown_ms: i64,
    mode: GuardMode,
    state: Mutex<AlertState>,
}

impl AlertGate {
    pub fn new(cooldown_ms: i64, mode: GuardMode) -> Self {
        Self {
            cooldown_ms: cooldown_ms.max(0),
            mode,
            state: Mutex::new(AlertState::default()),
        }
    }

    pub fn cooldown_ms(&self) -> i64 {
        self.cooldown_ms
    }

    pub fn mode(&self) -> GuardMode {
        self.mode
    }

    pub fn state(&self) -> AlertState {
        *self.lock()
    }

    /// Evaluate one reading against the shared state.
    pub fn evaluate(&self, is_falling: bool, now: Timestamp) -> AlertDecision {
        match self.mode {
            GuardMode::Guarded => {
                let mut state = self.lock();
                let (next, decision) =
                    AlertDebouncer::step(self.cooldown_ms, *state, is_falling, now);
                *state = next;
                decision
            }
            GuardMode::Racy => {
                let observed = self.state();
                let (next, decision) =
                    AlertDebouncer::step(self.cooldown_ms, observed, is_falling, now);
                *self.lock() = next;
                decision
            }
        }
    }

    // AlertState is Copy and always written whole, so a poisoned lock still
    // holds a consistent value.
    fn lock(&self) -> MutexGuard<'_, AlertState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
