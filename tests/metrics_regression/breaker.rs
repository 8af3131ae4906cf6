//! Breaker metrics regression tests

use super::helpers::*;
use serial_test::serial;
use std::time::Duration;
use tollgate_breaker::{BreakerConfig, BreakerGroup};
use tollgate_core::ManualClock;

fn group(clock: &ManualClock) -> BreakerGroup {
    BreakerGroup::new(
        BreakerConfig::builder()
            .k(2.0)
            .window(Duration::from_secs(1))
            .seed(11)
            .clock(clock.shared())
            .build()
            .unwrap(),
    )
    .unwrap()
}

#[test]
#[serial]
fn breaker_metrics_exist() {
    init_recorder();

    let clock = ManualClock::new();
    let group = group(&clock);
    let breaker = group.get("test_breaker");

    breaker.mark_success();
    for _ in 0..500 {
        breaker.mark_failed();
    }
    for _ in 0..50 {
        let _ = breaker.allow();
    }
    clock.advance(Duration::from_secs(2));
    breaker.allow().unwrap();

    // Verify admission counter
    assert_counter_exists("breaker_requests_total");
    assert_metric_has_label("breaker_requests_total", "breaker", "test_breaker");
    assert_metric_has_label("breaker_requests_total", "outcome", "allowed");
    assert_metric_has_label("breaker_requests_total", "outcome", "rejected");

    // Verify outcome counter
    assert_counter_exists("breaker_marks_total");
    assert_metric_has_label("breaker_marks_total", "outcome", "success");
    assert_metric_has_label("breaker_marks_total", "outcome", "failure");

    // Verify transition counter
    assert_counter_exists("breaker_transitions_total");
    assert_metric_has_label("breaker_transitions_total", "from", "closed");
    assert_metric_has_label("breaker_transitions_total", "to", "open");
    assert_metric_has_label("breaker_transitions_total", "from", "open");
    assert_metric_has_label("breaker_transitions_total", "to", "closed");

    // Verify state gauge
    assert_gauge_exists("breaker_state");
    assert_metric_has_label("breaker_state", "breaker", "test_breaker");
}

#[test]
#[serial]
fn breaker_counts_match_calls() {
    init_recorder();

    let clock = ManualClock::new();
    let group = group(&clock);
    let breaker = group.get("counted_breaker");

    for _ in 0..30 {
        breaker.mark_success();
    }
    for _ in 0..12 {
        breaker.mark_failed();
    }
    for _ in 0..25 {
        breaker.allow().unwrap();
    }

    let labels = |outcome| [("breaker", "counted_breaker"), ("outcome", outcome)];
    assert_eq!(counter_value("breaker_marks_total", &labels("success")), 30);
    assert_eq!(counter_value("breaker_marks_total", &labels("failure")), 12);
    assert_eq!(counter_value("breaker_requests_total", &labels("allowed")), 25);
    assert_eq!(counter_value("breaker_requests_total", &labels("rejected")), 0);
}
