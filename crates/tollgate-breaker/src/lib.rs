//! An adaptive circuit breaker.
//!
//! Instead of the usual closed / open / half-open state machine, the breaker
//! sheds load with a probability computed from the recent success rate. It
//! never blocks all traffic and needs no probe state: as successes return,
//! the drop ratio falls back to zero by itself.
//!
//! Outcomes are recorded into a time-bucketed rolling window
//! ([`tollgate_rolling::RollingCounter`]) so only the last `window` of
//! traffic counts.
//!
//! # Basic usage
//!
//! ```rust
//! use std::time::Duration;
//! use tollgate_breaker::{BreakerConfig, BreakerGroup};
//!
//! let group = BreakerGroup::new(
//!     BreakerConfig::builder()
//!         .k(1.5)
//!         .window(Duration::from_secs(3))
//!         .buckets(10)
//!         .request(100)
//!         .build()
//!         .unwrap(),
//! )
//! .unwrap();
//!
//! let breaker = group.get("inventory");
//! if breaker.allow().is_ok() {
//!     // call the backend...
//!     let ok = true;
//!     if ok {
//!         breaker.mark_success();
//!     } else {
//!         breaker.mark_failed();
//!     }
//! }
//! ```
//!
//! # Process-wide group
//!
//! [`init`] installs a default configuration, [`go`] runs a closure through
//! the process-wide group:
//!
//! ```rust
//! let res: Result<&str, &str> = tollgate_breaker::go(
//!     "search",
//!     || Ok("fresh"),
//!     |_rejected| Ok("stale"),
//! );
//! assert!(res.is_ok());
//! ```
//!
//! # Tower
//!
//! [`BreakerLayer`] wraps any `tower::Service` and marks each call from its
//! result.
//!
//! # Feature flags
//!
//! - `tracing`: state transitions at `info`, rejections at `trace`, reloads
//!   at `debug`
//! - `metrics`: `breaker_requests_total`, `breaker_marks_total`,
//!   `breaker_transitions_total` and the `breaker_state` gauge
//! - `serde`: `Serialize`/`Deserialize` for [`BreakerConfig`] and
//!   [`BreakerState`]

#[cfg(feature = "metrics")]
use metrics::{describe_counter, describe_gauge};
#[cfg(feature = "metrics")]
use std::sync::Once;

pub use breaker::{Breaker, BreakerMetrics, BreakerState};
pub use config::{BreakerConfig, BreakerConfigBuilder};
pub use error::{BreakerError, BreakerServiceError, Result};
pub use events::BreakerEvent;
pub use group::{default_config, go, group, init, BreakerGroup};
pub use layer::{BreakerLayer, BreakerService, BreakerServiceWithFallback};

mod breaker;
mod config;
mod error;
mod events;
mod group;
mod layer;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

#[cfg(feature = "metrics")]
pub(crate) fn describe_metrics() {
    METRICS_INIT.call_once(|| {
        describe_counter!(
            "breaker_requests_total",
            "Admission decisions made by the breaker"
        );
        describe_counter!(
            "breaker_marks_total",
            "Call outcomes recorded into the breaker window"
        );
        describe_counter!(
            "breaker_transitions_total",
            "Advisory state transitions of the breaker"
        );
        describe_gauge!(
            "breaker_state",
            "Advisory breaker state (0 = closed, 1 = open)"
        );
    });
}
