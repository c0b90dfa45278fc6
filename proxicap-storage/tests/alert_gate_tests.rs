//! Concurrency and property tests for the shared alert gate.

use std::sync::{Arc, Barrier};
use std::thread;

use proptest::prelude::*;
use proxicap_storage::{AlertGate, GuardMode};
use proxicap_test_utils::fixed_start;

#[test]
fn test_guarded_gate_fires_once_under_contention() {
    for _ in 0..20 {
        let gate = Arc::new(AlertGate::new(30_000, GuardMode::Guarded));
        let barrier = Arc::new(Barrier::new(8));
        let now = fixed_start();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    gate.evaluate(true, now).should_alert()
                })
            })
            .collect();

        let fired = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .filter(|fired| *fired)
            .count();

        assert_eq!(fired, 1);
        assert!(gate.state().was_falling);
    }
}

#[test]
fn test_zero_cooldown_still_requires_rising_edge() {
    let gate = AlertGate::new(0, GuardMode::Guarded);
    let now = fixed_start();
    let later = now + chrono::Duration::milliseconds(1);

    assert!(gate.evaluate(true, now).should_alert());
    assert!(!gate.evaluate(true, later).should_alert());
    gate.evaluate(false, later);
    assert!(gate
        .evaluate(true, later + chrono::Duration::milliseconds(1))
        .should_alert());
}

#[test]
fn test_negative_cooldown_is_clamped() {
    assert_eq!(AlertGate::new(-5, GuardMode::Racy).cooldown_ms(), 0);
}

proptest! {
    #[test]
    fn prop_modes_agree_when_sequential(
        steps in prop::collection::vec((any::<bool>(), 0i64..60_000), 1..40)
    ) {
        let guarded = AlertGate::new(30_000, GuardMode::Guarded);
        let racy = AlertGate::new(30_000, GuardMode::Racy);
        let mut now = fixed_start();

        for (falling, gap) in steps {
            now += chrono::Duration::milliseconds(gap);
            let a = guarded.evaluate(falling, now);
            let b = racy.evaluate(falling, now);
            prop_assert_eq!(a, b);
        }
        prop_assert_eq!(guarded.state(), racy.state());
    }
}
