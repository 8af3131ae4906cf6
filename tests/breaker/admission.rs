use super::{mark, rejection_rate, sre};
use tollgate_breaker::{Breaker, BreakerConfig, BreakerState};
use tollgate_core::{ManualClock, ResilienceError};

#[test]
fn admits_everything_below_request_volume() {
    let clock = ManualClock::new();
    let config = BreakerConfig::builder()
        .clock(clock.shared())
        .build()
        .unwrap();
    let breaker = Breaker::new("warmup", &config).unwrap();

    mark(&breaker, 80, 0);
    assert_eq!(rejection_rate(&breaker, 1_000), 0.0);

    let breaker = Breaker::new("all-failing", &config).unwrap();
    mark(&breaker, 0, 99);
    assert_eq!(rejection_rate(&breaker, 1_000), 0.0);
    assert_eq!(breaker.state(), BreakerState::Closed);
}

#[test]
fn healthy_traffic_is_never_shed() {
    let clock = ManualClock::new();
    let breaker = Breaker::new("healthy", &sre(&clock).build().unwrap()).unwrap();

    mark(&breaker, 10_000, 0);
    assert_eq!(rejection_rate(&breaker, 1_000), 0.0);
    assert_eq!(breaker.metrics().drop_ratio, 0.0);
}

#[test]
fn rejection_tracks_the_excess_over_k_successes() {
    let clock = ManualClock::new();
    let breaker = Breaker::new("degraded", &sre(&clock).build().unwrap()).unwrap();

    mark(&breaker, 100, 200);

    let expected = (300.0 - 2.0 * 100.0) / 301.0;
    let observed = rejection_rate(&breaker, 20_000);
    assert!(
        (observed - expected).abs() < 0.02,
        "observed {observed}, expected {expected}"
    );
    assert_eq!(breaker.state(), BreakerState::Open);

    let metrics = breaker.metrics();
    assert_eq!(metrics.successes, 100);
    assert_eq!(metrics.total, 300);
    assert!((metrics.drop_ratio - expected).abs() < 1e-9);
}

#[test]
fn total_outage_still_lets_probes_through() {
    let clock = ManualClock::new();
    let breaker = Breaker::new("outage", &sre(&clock).build().unwrap()).unwrap();

    mark(&breaker, 0, 999);

    let observed = rejection_rate(&breaker, 100_000);
    assert!(observed < 1.0);
    assert!((observed - 0.999).abs() < 0.002, "observed {observed}");
}

#[test]
fn larger_k_tolerates_more_failures() {
    let clock = ManualClock::new();
    let strict = Breaker::new("strict", &sre(&clock).k(1.1).build().unwrap()).unwrap();
    let lenient = Breaker::new("lenient", &sre(&clock).k(4.0).build().unwrap()).unwrap();

    for breaker in [&strict, &lenient] {
        mark(breaker, 100, 150);
    }

    assert!(rejection_rate(&strict, 10_000) > 0.4);
    assert_eq!(rejection_rate(&lenient, 10_000), 0.0);
}

#[test]
fn allow_does_not_count_as_an_outcome() {
    let clock = ManualClock::new();
    let breaker = Breaker::new("pure", &sre(&clock).build().unwrap()).unwrap();

    for _ in 0..500 {
        breaker.allow().unwrap();
    }
    assert_eq!(breaker.metrics().total, 0);
}

#[test]
fn rejection_names_the_breaker() {
    let clock = ManualClock::new();
    let breaker = Breaker::new("10.0.0.7:6379", &sre(&clock).build().unwrap()).unwrap();
    mark(&breaker, 0, 1_000);

    let err = (0..100).find_map(|_| breaker.allow().err()).unwrap();
    assert_eq!(
        err.to_string(),
        "service unavailable: breaker '10.0.0.7:6379' rejected the call"
    );

    let unified: ResilienceError<std::io::Error> = err.into();
    assert!(unified.is_unavailable());
}

#[test]
fn switched_off_breaker_admits_a_total_outage() {
    let clock = ManualClock::new();
    let breaker = Breaker::new("off", &sre(&clock).switch_off(true).build().unwrap()).unwrap();

    mark(&breaker, 0, 5_000);
    assert_eq!(rejection_rate(&breaker, 1_000), 0.0);
    assert_eq!(breaker.metrics().drop_ratio, 0.0);
}
