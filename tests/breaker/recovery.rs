use super::{mark, rejection_rate, sre};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tollgate_breaker::{Breaker, BreakerState};
use tollgate_core::{Clock, ManualClock};

#[test]
fn shedding_stops_once_failures_leave_the_window() {
    let clock = ManualClock::new();
    let breaker = Breaker::new("db", &sre(&clock).build().unwrap()).unwrap();

    mark(&breaker, 0, 300);
    assert!(rejection_rate(&breaker, 1_000) > 0.9);

    clock.advance(Duration::from_millis(500));
    mark(&breaker, 200, 0);
    // 200 successes against 500 calls: threshold 400.
    let partial = rejection_rate(&breaker, 10_000);
    assert!((partial - 100.0 / 501.0).abs() < 0.02, "partial {partial}");

    clock.advance(Duration::from_millis(600));
    // Only the successes are left.
    let metrics = breaker.metrics();
    assert_eq!((metrics.successes, metrics.total), (200, 200));
    assert_eq!(rejection_rate(&breaker, 1_000), 0.0);
    assert_eq!(breaker.state(), BreakerState::Closed);
}

#[test]
fn idle_window_resets_to_admitting() {
    let clock = ManualClock::new();
    let breaker = Breaker::new("idle", &sre(&clock).build().unwrap()).unwrap();

    mark(&breaker, 0, 1_000);
    assert!(rejection_rate(&breaker, 100) > 0.9);

    clock.advance(Duration::from_secs(30));
    assert_eq!(breaker.metrics().total, 0);
    assert!(breaker.allow().is_ok());
}

#[test]
fn clock_stepping_backwards_clears_the_window() {
    let clock = ManualClock::new();
    let start = clock.now();
    clock.advance(Duration::from_secs(5));
    let breaker = Breaker::new("skew", &sre(&clock).build().unwrap()).unwrap();

    mark(&breaker, 0, 1_000);
    clock.set(start);

    assert_eq!(breaker.metrics().total, 0);
    assert!(breaker.allow().is_ok());
}

#[test]
fn transitions_are_reported_once_per_change() {
    let clock = ManualClock::new();
    let transitions = Arc::new(Mutex::new(Vec::new()));
    let t = Arc::clone(&transitions);
    let rejections = Arc::new(Mutex::new(0usize));
    let r = Arc::clone(&rejections);

    let config = sre(&clock)
        .on_state_transition(move |from, to| t.lock().unwrap().push((from, to)))
        .on_rejected(move |_| *r.lock().unwrap() += 1)
        .build()
        .unwrap();
    let breaker = Breaker::new("api", &config).unwrap();

    mark(&breaker, 10, 500);
    let rejected = (0..200).filter(|_| breaker.allow().is_err()).count();
    assert!(rejected > 0);
    assert_eq!(*rejections.lock().unwrap(), rejected);

    clock.advance(Duration::from_secs(2));
    for _ in 0..200 {
        breaker.allow().unwrap();
    }

    assert_eq!(
        *transitions.lock().unwrap(),
        vec![
            (BreakerState::Closed, BreakerState::Open),
            (BreakerState::Open, BreakerState::Closed),
        ]
    );
}
