//! A concurrent async resource pool.
//!
//! [`Pool`] hands out reusable items (connections, sessions, buffers) made
//! by a [`Factory`], bounded by two limits:
//!
//! - **active**: how many items may exist at once, idle or checked out
//! - **idle**: how many returned items are kept warm for reuse
//!
//! At the active limit a checkout either fails fast with
//! [`PoolError::Exhausted`] or waits, bounded by the configured wait
//! timeout, by [`Pool::get_timeout`], or by dropping the future. Idle items
//! older than the idle timeout are closed lazily on checkout and by a
//! background sweep.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use futures::future::BoxFuture;
//! use tollgate_pool::{Factory, Pool, PoolConfig, PoolError};
//!
//! struct Dialer {
//!     addr: String,
//! }
//!
//! struct Conn {
//!     peer: String,
//! }
//!
//! impl Factory for Dialer {
//!     type Item = Conn;
//!     type Error = std::io::Error;
//!
//!     fn create(&self) -> BoxFuture<'_, Result<Conn, std::io::Error>> {
//!         Box::pin(async move { Ok(Conn { peer: self.addr.clone() }) })
//!     }
//!
//!     fn close(&self, _conn: Conn) -> Result<(), std::io::Error> {
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PoolConfig::builder()
//!     .name("backend")
//!     .active(10)
//!     .idle(4)
//!     .idle_timeout(Some(Duration::from_secs(60)))
//!     .wait_timeout(Some(Duration::from_millis(200)))
//!     .build()?;
//!
//! let pool = Pool::new(config, Dialer { addr: "10.0.0.7:6379".into() })?;
//!
//! let conn = pool.get().await?;
//! assert_eq!(conn.peer, "10.0.0.7:6379");
//! pool.put(conn, false)?;
//!
//! match pool.get_timeout(Duration::from_millis(10)).await {
//!     Ok(conn) => pool.put(conn, false)?,
//!     Err(PoolError::Timeout) | Err(PoolError::Exhausted) => { /* shed the request */ }
//!     Err(e) => return Err(e.into()),
//! }
//!
//! pool.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Feature flags
//!
//! - `tracing`: item lifecycle at `debug`, close failures at `warn`, pool
//!   shutdown at `info`
//! - `metrics`: `pool_get_total`, `pool_items_active`, `pool_items_idle`,
//!   `pool_items_evicted_total` and `pool_wait_duration_seconds`, labelled
//!   with the pool name
//! - `serde`: `Serialize`/`Deserialize` for [`PoolConfig`]

#[cfg(feature = "metrics")]
use metrics::{describe_counter, describe_gauge, describe_histogram};
#[cfg(feature = "metrics")]
use std::sync::Once;

pub use config::{PoolConfig, PoolConfigBuilder};
pub use error::PoolError;
pub use events::PoolEvent;
pub use pool::{factory_fn, Factory, FnFactory, Pool, PoolStats};

mod config;
mod error;
mod events;
mod pool;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

#[cfg(feature = "metrics")]
pub(crate) fn describe_metrics() {
    METRICS_INIT.call_once(|| {
        describe_counter!(
            "pool_get_total",
            "Checkouts by outcome (reused, created, handoff, exhausted, timeout, closed, error)"
        );
        describe_gauge!(
            "pool_items_active",
            "Items open, idle or checked out, including those being created"
        );
        describe_gauge!("pool_items_idle", "Items waiting in the free list");
        describe_counter!(
            "pool_items_evicted_total",
            "Idle items closed after outliving the idle timeout"
        );
        describe_histogram!(
            "pool_wait_duration_seconds",
            "Time checkouts spent waiting for an item"
        );
    });
}
