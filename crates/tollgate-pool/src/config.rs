//! Configuration for the resource pool.

use crate::events::PoolEvent;
use std::fmt;
use std::time::Duration;
use tollgate_core::{ConfigError, EventListeners, FnListener};

const DEFAULT_IDLE_ITEMS: usize = 2;

/// Configuration for a [`Pool`](crate::Pool).
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Name of this pool, used in events, logs and metric labels.
    pub(crate) name: String,
    /// Maximum number of open items; 0 means unlimited.
    pub(crate) active: usize,
    /// Maximum number of free items kept; 0 means the default, negative means none.
    pub(crate) idle: isize,
    /// How long a free item may sit unused before it is closed.
    pub(crate) idle_timeout: Option<Duration>,
    /// How long a checkout may wait when the pool is at its active limit.
    pub(crate) wait_timeout: Option<Duration>,
    /// Whether a checkout waits without a timeout of its own.
    pub(crate) wait: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) event_listeners: EventListeners<PoolEvent>,
}

impl PoolConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }

    /// Checks the active/idle relationship and normalizes zero durations.
    ///
    /// # Errors
    ///
    /// [`ConfigError::IdleExceedsActive`] if a positive `idle` is larger
    /// than `active`. An unlimited pool (`active` of 0) accepts only a zero
    /// or negative `idle`.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.idle > 0 && self.idle as usize > self.active {
            return Err(ConfigError::IdleExceedsActive {
                active: self.active,
                idle: self.idle,
            });
        }
        self.idle_timeout = self.idle_timeout.filter(|d| !d.is_zero());
        self.wait_timeout = self.wait_timeout.filter(|d| !d.is_zero());
        Ok(self)
    }

    /// Name of the pool.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum number of open items; 0 means unlimited.
    pub fn active(&self) -> usize {
        self.active
    }

    /// Configured idle count, as given.
    pub fn idle(&self) -> isize {
        self.idle
    }

    /// Idle timeout, if eviction is enabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    /// Wait timeout, if any.
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout
    }

    /// Whether checkouts wait without a configured timeout.
    pub fn wait(&self) -> bool {
        self.wait
    }

    /// Number of free items the pool keeps.
    pub fn max_idle(&self) -> usize {
        match self.idle {
            0 => DEFAULT_IDLE_ITEMS,
            n if n < 0 => 0,
            n => n as usize,
        }
    }

    pub(crate) fn is_limited(&self) -> bool {
        self.active > 0
    }

    pub(crate) fn can_wait(&self) -> bool {
        self.wait || self.wait_timeout.is_some()
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "pool".to_string(),
            active: 0,
            idle: 0,
            idle_timeout: None,
            wait_timeout: None,
            wait: false,
            event_listeners: EventListeners::new(),
        }
    }
}

impl fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfig")
            .field("name", &self.name)
            .field("active", &self.active)
            .field("idle", &self.idle)
            .field("idle_timeout", &self.idle_timeout)
            .field("wait_timeout", &self.wait_timeout)
            .field("wait", &self.wait)
            .field("listeners", &self.event_listeners.len())
            .finish()
    }
}

/// Builder for [`PoolConfig`].
pub struct PoolConfigBuilder {
    name: String,
    active: usize,
    idle: isize,
    idle_timeout: Option<Duration>,
    wait_timeout: Option<Duration>,
    wait: bool,
    event_listeners: EventListeners<PoolEvent>,
}

impl PoolConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            name: "pool".to_string(),
            active: 0,
            idle: 0,
            idle_timeout: None,
            wait_timeout: None,
            wait: false,
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the name of this pool.
    ///
    /// Default: "pool"
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the maximum number of items open at once, idle or checked out.
    ///
    /// Zero removes the limit, in which case checkouts never wait and
    /// `idle` must be zero or negative.
    ///
    /// Default: 0
    pub fn active(mut self, active: usize) -> Self {
        self.active = active;
        self
    }

    /// Sets how many free items the pool keeps for reuse.
    ///
    /// Items returned beyond this count are closed. Zero selects the
    /// default of 2; a negative value keeps no free items at all. A
    /// positive value larger than `active` fails at build time.
    ///
    /// Default: 0 (2 items)
    pub fn idle(mut self, idle: isize) -> Self {
        self.idle = idle;
        self
    }

    /// Sets how long a free item may sit unused before it is closed.
    ///
    /// Expired items are skipped on checkout and swept by a background task.
    /// `None` or a zero duration disables expiry.
    ///
    /// Default: None
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Sets how long a checkout may wait for an item when the pool is at
    /// its active limit.
    ///
    /// Default: None
    pub fn wait_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Makes checkouts wait for an item when the pool is at its active
    /// limit, even without a wait timeout. The wait is then bounded only by
    /// [`Pool::get_timeout`](crate::Pool::get_timeout) or by dropping the
    /// future.
    ///
    /// Default: false
    pub fn wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    /// Registers a callback invoked each time the factory creates an item.
    ///
    /// The callback receives the number of open items after the creation.
    pub fn on_item_created<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &PoolEvent| {
                if let PoolEvent::ItemCreated { active, .. } = event {
                    f(*active);
                }
            }));
        self
    }

    /// Registers a callback invoked when an idle item is evicted.
    ///
    /// # Example
    /// ```rust
    /// use std::time::Duration;
    /// use tollgate_pool::PoolConfig;
    ///
    /// let config = PoolConfig::builder()
    ///     .idle_timeout(Some(Duration::from_secs(30)))
    ///     .on_item_evicted(|idle_for| {
    ///         println!("closed connection idle for {:?}", idle_for);
    ///     })
    ///     .build()
    ///     .unwrap();
    /// # let _ = config;
    /// ```
    pub fn on_item_evicted<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &PoolEvent| {
                if let PoolEvent::ItemEvicted { idle_for, .. } = event {
                    f(*idle_for);
                }
            }));
        self
    }

    /// Registers a callback invoked when a checkout fails because the pool
    /// is exhausted.
    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &PoolEvent| {
                if matches!(event, PoolEvent::Exhausted { .. }) {
                    f();
                }
            }));
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// See [`PoolConfig::validate`].
    pub fn build(self) -> Result<PoolConfig, ConfigError> {
        PoolConfig {
            name: self.name,
            active: self.active,
            idle: self.idle,
            idle_timeout: self.idle_timeout,
            wait_timeout: self.wait_timeout,
            wait: self.wait,
            event_listeners: self.event_listeners,
        }
        .validate()
    }
}

impl Default for PoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
