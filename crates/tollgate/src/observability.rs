//! Observability guide for tollgate.
//!
//! Metrics, logs and events for the pool and the breaker.

/// Metrics documentation
pub mod metrics {
    //! # Metrics Guide
    //!
    //! Both components record through the [`metrics`](https://docs.rs/metrics)
    //! facade when the `metrics` feature is on. Install any recorder
    //! (Prometheus exporter, StatsD, ...) to collect them.
    //!
    //! ```toml
    //! [dependencies]
    //! tollgate = { version = "0.1", features = ["full", "metrics"] }
    //! metrics = "0.24"
    //! metrics-exporter-prometheus = "0.16"
    //! ```
    //!
    //! ## Instance Naming
    //!
    //! Pool metrics carry the pool name (`PoolConfig::builder().name(..)`);
    //! breaker metrics carry the key the breaker was fetched with from its
    //! group:
    //!
    //! ```text
    //! pool_items_active{pool="redis"} 12
    //! breaker_requests_total{breaker="10.0.0.7:6379",outcome="rejected"} 31
    //! ```
    //!
    //! ## Available Metrics
    //!
    //! ### Pool
    //!
    //! - `pool_get_total{pool, outcome}` - Checkouts (reused/created/handoff/exhausted/timeout/closed/error)
    //! - `pool_items_active{pool}` - Open items gauge, idle or checked out
    //! - `pool_items_idle{pool}` - Free list length gauge
    //! - `pool_items_evicted_total{pool}` - Idle items closed after the idle timeout
    //! - `pool_wait_duration_seconds{pool}` - Time spent waiting at the active limit
    //!
    //! ### Breaker
    //!
    //! - `breaker_requests_total{breaker, outcome}` - Admission decisions (allowed/rejected)
    //! - `breaker_marks_total{breaker, outcome}` - Recorded outcomes (success/failure)
    //! - `breaker_transitions_total{breaker, from, to}` - Advisory state transitions
    //! - `breaker_state{breaker}` - Advisory state gauge (0 = closed, 1 = open)
    //!
    //! ## Example Prometheus Queries
    //!
    //! ```promql
    //! # Share of calls shed by a breaker
    //! rate(breaker_requests_total{outcome="rejected"}[1m])
    //!   /
    //! rate(breaker_requests_total[1m])
    //!
    //! # Pool checkouts that could not be served
    //! rate(pool_get_total{outcome=~"exhausted|timeout"}[5m])
    //!
    //! # P99 wait at the active limit
    //! histogram_quantile(0.99, rate(pool_wait_duration_seconds_bucket[5m]))
    //! ```
}

/// Tracing documentation
pub mod tracing_guide {
    //! # Tracing Guide
    //!
    //! Enable structured logs with the `tracing` feature:
    //!
    //! ```toml
    //! [dependencies]
    //! tollgate = { version = "0.1", features = ["full", "tracing"] }
    //! tracing-subscriber = "0.3"
    //! ```
    //!
    //! ```text
    //! DEBUG tollgate_pool: created pooled item pool="redis"
    //! DEBUG tollgate_pool: evicted idle items pool="redis" evicted=3
    //! WARN  tollgate_pool: failed to close pooled item pool="redis"
    //! INFO  tollgate_breaker: breaker state transition breaker="10.0.0.7:6379" from="closed" to="open"
    //! TRACE tollgate_breaker: call rejected breaker="10.0.0.7:6379" total=412 successes=120 drop_ratio=0.56
    //! ```
}

/// Event system documentation
pub mod events {
    //! # Event System Guide
    //!
    //! Listeners registered on the configuration builders run synchronously
    //! whenever the component does something noteworthy:
    //!
    //! ```rust,ignore
    //! let config = PoolConfig::builder()
    //!     .on_item_evicted(|idle_for| println!("evicted after {:?}", idle_for))
    //!     .on_exhausted(|| alerts.pool_saturated())
    //!     .build()?;
    //!
    //! let config = BreakerConfig::builder()
    //!     .on_state_transition(|from, to| println!("{:?} -> {:?}", from, to))
    //!     .on_rejected(|drop_ratio| println!("shedding at {:.0}%", drop_ratio * 100.0))
    //!     .build()?;
    //! ```
    //!
    //! For anything beyond closures, implement
    //! [`EventListener`](crate::core::EventListener) for `PoolEvent` or
    //! `BreakerEvent`.
}
