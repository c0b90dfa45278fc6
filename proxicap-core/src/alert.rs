//! Fall alert debouncing: rising-edge detection followed by a cooldown gate.
//!
//! # State Machine
//!
//! ```text
//!                 falling && !was_falling
//!   Normal ───────────────────────────────► Falling ──┐
//!     ▲                                        │      │ falling (no edge)
//!     │            !falling                    │ ◄────┘
//!     └────────────────────────────────────────┘
//!
//!   Edge fires only if  last_alert_at is None  or  now - last_alert_at > cooldown
//! ```
//!
//! Edge detection keeps a sustained fall from re-alerting on every sample.
//! The cooldown caps rapid Normal/Fall toggling at one alert per window.
//! A fall that persists past the cooldown does not alert again: there is no
//! second edge until a Normal reading intervenes.

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// Minimum gap between two alert dispatches.
pub const DEFAULT_ALERT_COOLDOWN_MS: i64 = 30_000;

/// Debouncer memory carried between readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertState {
    pub was_falling: bool,
    /// `None` until the first alert fires.
    pub last_alert_at: Option<Timestamp>,
}

/// What a single evaluation decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertDecision {
    /// The reading is a transition into falling.
    pub rising_edge: bool,
    /// The edge passed the cooldown gate; a notification should go out.
    pub fire: bool,
    /// Cooldown still to run at evaluation time, before this decision.
    pub cooldown_remaining_ms: i64,
    /// Last alert time after this evaluation.
    pub last_alert_at: Option<Timestamp>,
}

impl AlertDecision {
    pub fn should_alert(&self) -> bool {
        self.fire
    }

    /// An edge that the cooldown swallowed.
    pub fn suppressed(&self) -> bool {
        self.rising_edge && !self.fire
    }
}

/// Rising-edge + cooldown alert gate over a single device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertDebouncer {
    cooldown_ms: i64,
    state: AlertState,
}

impl Default for AlertDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_COOLDOWN_MS)
    }
}

impl AlertDebouncer {
    pub fn new(cooldown_ms: i64) -> Self {
        Self {
            cooldown_ms: cooldown_ms.max(0),
            state: AlertState::default(),
        }
    }

    pub fn cooldown_ms(&self) -> i64 {
        self.cooldown_ms
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    /// Feed one reading and update the stored state.
    pub fn evaluate(&mut self, is_falling: bool, now: Timestamp) -> AlertDecision {
        let (next, decision) = Self::step(self.cooldown_ms, self.state, is_falling, now);
        self.state = next;
        decision
    }

    /// Pure transition function behind [`evaluate`](Self::evaluate).
    ///
    /// `was_falling` always becomes `is_falling`; `last_alert_at` moves to
    /// `now` only when the decision fires.
    pub fn step(
        cooldown_ms: i64,
        state: AlertState,
        is_falling: bool,
        now: Timestamp,
    ) -> (AlertState, AlertDecision) {
        let rising_edge = is_falling && !state.was_falling;

        let elapsed_ms = state
            .last_alert_at
            .map(|last| (now - last).num_milliseconds());
        let cooldown_open = elapsed_ms.map_or(true, |elapsed| elapsed > cooldown_ms);
        let cooldown_remaining_ms = elapsed_ms.map_or(0, |elapsed| (cooldown_ms - elapsed).max(0));

        let fire = rising_edge && cooldown_open;
        let last_alert_at = if fire { Some(now) } else { state.last_alert_at };

        let next = AlertState {
            was_falling: is_falling,
            last_alert_at,
        };
        let decision = AlertDecision {
            rising_edge,
            fire,
            cooldown_remaining_ms,
            last_alert_at,
        };
        (next, decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_normal_then_fall_fires_once() {
        let mut debouncer = AlertDebouncer::default();
        let now = t0();

        assert!(!debouncer.evaluate(false, now).should_alert());
        let decision = debouncer.evaluate(true, now + Duration::seconds(1));
        assert!(decision.rising_edge);
        assert!(decision.should_alert());
        assert_eq!(debouncer.state().last_alert_at, Some(now + Duration::seconds(1)));
    }

    #[test]
    fn test_first_reading_fall_fires() {
        let mut debouncer = AlertDebouncer::default();
        assert!(debouncer.evaluate(true, t0()).should_alert());
    }

    #[test]
    fn test_sustained_fall_never_refires() {
        let mut debouncer = AlertDebouncer::default();
        let now = t0();
        assert!(debouncer.evaluate(true, now).should_alert());
        assert!(!debouncer.evaluate(true, now + Duration::seconds(5)).should_alert());

        let late = debouncer.evaluate(true, now + Duration::seconds(45));
        assert!(!late.rising_edge);
        assert!(!late.should_alert());
    }

    #[test]
    fn test_toggle_within_cooldown_is_suppressed() {
        let mut debouncer = AlertDebouncer::default();
        let now = t0();
        assert!(debouncer.evaluate(true, now).should_alert());
        debouncer.evaluate(false, now + Duration::seconds(5));

        let decision = debouncer.evaluate(true, now + Duration::seconds(10));
        assert!(decision.suppressed());
        assert_eq!(decision.cooldown_remaining_ms, 20_000);
        assert_eq!(debouncer.state().last_alert_at, Some(now));
    }

    #[test]
    fn test_cooldown_boundary_is_strict() {
        let mut debouncer = AlertDebouncer::default();
        let now = t0();
        debouncer.evaluate(true, now);
        debouncer.evaluate(false, now + Duration::seconds(1));

        let at_boundary = debouncer.evaluate(true, now + Duration::milliseconds(30_000));
        assert!(at_boundary.suppressed());

        debouncer.evaluate(false, now + Duration::milliseconds(30_000));
        let past_boundary = debouncer.evaluate(true, now + Duration::milliseconds(30_001));
        assert!(past_boundary.should_alert());
    }

    #[test]
    fn test_was_falling_tracks_every_reading() {
        let mut debouncer = AlertDebouncer::default();
        let now = t0();
        debouncer.evaluate(true, now);
        assert!(debouncer.state().was_falling);
        debouncer.evaluate(false, now);
        assert!(!debouncer.state().was_falling);
    }

    #[test]
    fn test_step_is_pure() {
        let state = AlertState::default();
        let (first, a) = AlertDebouncer::step(DEFAULT_ALERT_COOLDOWN_MS, state, true, t0());
        let (second, b) = AlertDebouncer::step(DEFAULT_ALERT_COOLDOWN_MS, state, true, t0());
        assert_eq!(first, second);
        assert_eq!(a, b);
        assert!(a.fire);
    }
}
