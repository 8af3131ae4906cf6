//! Time-bucketed rolling windows.
//!
//! A [`Window`] is a fixed ring of [`Bucket`]s. A [`RollingPolicy`] maps
//! elapsed time onto that ring: every `bucket_duration` the write position
//! moves one bucket forward and the buckets it passes over are cleared. Stale
//! buckets are cleared lazily by the next write, so an idle counter costs
//! nothing.
//!
//! [`RollingCounter`] accumulates values into the current bucket and is what
//! the adaptive breaker reads its success and request totals from.
//! [`RollingGauge`] keeps every observation as its own point.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tollgate_core::ManualClock;
//! use tollgate_rolling::RollingCounter;
//!
//! let clock = ManualClock::new();
//! let counter = RollingCounter::with_clock(10, Duration::from_millis(100), clock.shared());
//!
//! counter.add(3);
//! clock.advance(Duration::from_millis(150));
//! counter.add(4);
//! assert_eq!(counter.value(), 7);
//!
//! // A full window later, everything has aged out.
//! clock.advance(Duration::from_secs(1));
//! assert_eq!(counter.value(), 0);
//! ```

pub mod aggregation;
mod counter;
mod policy;
mod window;

pub use counter::{RollingCounter, RollingGauge};
pub use policy::RollingPolicy;
pub use window::{Bucket, Iter, Window};
