//! Property tests for the adaptive breaker.
//!
//! Invariants tested:
//! - The drop ratio follows max(0, (total - k * successes) / (total + 1))
//! - Below the request volume or the k threshold nothing is rejected
//! - Rejection is never certain

use proptest::prelude::*;
use std::time::Duration;
use tollgate_breaker::{Breaker, BreakerConfig};
use tollgate_core::ManualClock;

const REQUEST: u64 = 100;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: the reported drop ratio matches the formula
    #[test]
    fn drop_ratio_follows_formula(
        successes in 0u64..=400,
        failures in 0u64..=400,
        k in 1.0f64..=4.0,
        seed in any::<u64>(),
    ) {
        let clock = ManualClock::new();
        let config = BreakerConfig::builder()
            .k(k)
            .window(Duration::from_secs(1))
            .request(REQUEST)
            .seed(seed)
            .clock(clock.shared())
            .build()
            .unwrap();
        let breaker = Breaker::new("prop", &config).unwrap();
        for _ in 0..successes {
            breaker.mark_success();
        }
        for _ in 0..failures {
            breaker.mark_failed();
        }

        let total = successes + failures;
        let threshold = k * successes as f64;
        let expected = if total < REQUEST || (total as f64) < threshold {
            0.0
        } else {
            ((total as f64 - threshold) / (total as f64 + 1.0)).max(0.0)
        };

        let metrics = breaker.metrics();
        prop_assert_eq!(metrics.total, total);
        prop_assert_eq!(metrics.successes, successes);
        prop_assert!((metrics.drop_ratio - expected).abs() < 1e-9);
        prop_assert!(metrics.drop_ratio < 1.0);

        if expected == 0.0 {
            for _ in 0..100 {
                prop_assert!(breaker.allow().is_ok());
            }
        }
    }
}
