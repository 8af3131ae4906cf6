use std::time::Duration;

use tollgate_core::{MonotonicClock, SharedClock};

use crate::aggregation;
use crate::policy::RollingPolicy;
use crate::window::{Iter, Window};

/// A counter over a sliding time window.
///
/// Values only go up, which is why [`add`](Self::add) takes a `u64`. Values
/// written within the same bucket are summed into one point; the bucket's
/// count records how many writes it saw. The breaker relies on that split:
/// it adds `1` for a success and `0` for a failure, so the points sum to the
/// successes and the counts sum to the requests.
#[derive(Debug)]
pub struct RollingCounter {
    policy: RollingPolicy,
}

impl RollingCounter {
    /// Creates a counter of `size` buckets of `bucket_duration` each,
    /// reading the system clock.
    pub fn new(size: usize, bucket_duration: Duration) -> Self {
        Self::with_clock(size, bucket_duration, MonotonicClock::shared())
    }

    /// Like [`new`](Self::new) with an injected clock.
    pub fn with_clock(size: usize, bucket_duration: Duration, clock: SharedClock) -> Self {
        Self {
            policy: RollingPolicy::new(Window::new(size), bucket_duration, clock),
        }
    }

    /// Adds `val` to the current bucket.
    pub fn add(&self, val: u64) {
        self.policy.add(val as f64);
    }

    /// Reduces the live buckets with `f`.
    pub fn reduce<F, R>(&self, f: F) -> R
    where
        F: FnOnce(Iter<'_>) -> R,
        R: Default,
    {
        self.policy.reduce(f)
    }

    /// Sum over the window.
    pub fn sum(&self) -> f64 {
        self.policy.reduce(aggregation::sum)
    }

    /// Average point over the window.
    pub fn avg(&self) -> f64 {
        self.policy.reduce(aggregation::avg)
    }

    /// Smallest bucket total over the window.
    pub fn min(&self) -> f64 {
        self.policy.reduce(aggregation::min)
    }

    /// Largest bucket total over the window.
    pub fn max(&self) -> f64 {
        self.policy.reduce(aggregation::max)
    }

    /// Sum over the window, truncated to an integer.
    pub fn value(&self) -> u64 {
        self.sum() as u64
    }

    /// Whole buckets elapsed since the last write.
    pub fn timespan(&self) -> usize {
        self.policy.timespan()
    }
}

/// A gauge over a sliding time window.
///
/// Unlike [`RollingCounter`], every observation is kept as its own point, so
/// `min`, `max` and `avg` describe the individual readings.
#[derive(Debug)]
pub struct RollingGauge {
    policy: RollingPolicy,
}

impl RollingGauge {
    /// Creates a gauge of `size` buckets of `bucket_duration` each.
    pub fn new(size: usize, bucket_duration: Duration) -> Self {
        Self::with_clock(size, bucket_duration, MonotonicClock::shared())
    }

    /// Like [`new`](Self::new) with an injected clock.
    pub fn with_clock(size: usize, bucket_duration: Duration, clock: SharedClock) -> Self {
        Self {
            policy: RollingPolicy::new(Window::new(size), bucket_duration, clock),
        }
    }

    /// Records one reading.
    pub fn record(&self, val: f64) {
        self.policy.append(val);
    }

    /// Reduces the live buckets with `f`.
    pub fn reduce<F, R>(&self, f: F) -> R
    where
        F: FnOnce(Iter<'_>) -> R,
        R: Default,
    {
        self.policy.reduce(f)
    }

    pub fn sum(&self) -> f64 {
        self.policy.reduce(aggregation::sum)
    }

    pub fn avg(&self) -> f64 {
        self.policy.reduce(aggregation::avg)
    }

    pub fn min(&self) -> f64 {
        self.policy.reduce(aggregation::min)
    }

    pub fn max(&self) -> f64 {
        self.policy.reduce(aggregation::max)
    }

    /// Sum over the window, truncated to an integer.
    pub fn value(&self) -> i64 {
        self.sum() as i64
    }

    pub fn timespan(&self) -> usize {
        self.policy.timespan()
    }
}
