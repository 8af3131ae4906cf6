//! Building blocks for resilient network clients.
//!
//! `tollgate` bundles two independent primitives that most clients of a
//! remote service end up needing, plus the window they are measured with:
//!
//! - **Pool** (`pool` feature): hands out reusable items such as
//!   connections under an active limit and an idle limit, with optional
//!   bounded waiting and idle eviction
//! - **Breaker** (`breaker` feature): an adaptive circuit breaker that sheds
//!   a fraction of calls proportional to how far requests outnumber recent
//!   successes, and recovers on its own
//! - **Rolling** (`rolling` feature): the time-bucketed counter the breaker
//!   reads its statistics from
//!
//! Each component is its own crate and can be used directly.
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! tollgate = { version = "0.1", features = ["pool", "breaker"] }
//! ```
//!
//! # Example
//!
//! Guard a pooled call with a breaker: ask before dialing, report after.
//!
//! ```rust,no_run
//! # #[cfg(all(feature = "pool", feature = "breaker"))]
//! # {
//! use std::time::Duration;
//! use tollgate::breaker::{BreakerConfig, BreakerGroup};
//! use tollgate::core::ResilienceError;
//! use tollgate::pool::{factory_fn, Pool, PoolConfig};
//!
//! # async fn example() -> Result<(), ResilienceError<std::io::Error>> {
//! let pool = Pool::new(
//!     PoolConfig::builder()
//!         .active(16)
//!         .wait_timeout(Some(Duration::from_millis(100)))
//!         .build()
//!         .unwrap(),
//!     factory_fn(|| async { Ok::<_, std::io::Error>(Vec::<u8>::new()) }, |_| Ok(())),
//! )
//! .unwrap();
//! let breakers = BreakerGroup::new(BreakerConfig::default()).unwrap();
//!
//! let breaker = breakers.get("10.0.0.7:6379");
//! breaker.allow()?;
//! let conn = pool.get().await?;
//! // ... use the connection ...
//! breaker.mark_success();
//! pool.put(conn, false)?;
//! # Ok(())
//! # }
//! # }
//! ```

// Re-export core (always available)
pub use tollgate_core as core;

#[cfg(feature = "breaker")]
pub use tollgate_breaker as breaker;

#[cfg(feature = "pool")]
pub use tollgate_pool as pool;

#[cfg(feature = "rolling")]
pub use tollgate_rolling as rolling;

pub mod observability;
