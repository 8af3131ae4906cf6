use crate::breaker::Breaker;
use crate::config::BreakerConfig;
use crate::error::BreakerError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};
use tollgate_core::ConfigError;

/// A set of breakers, one per name, sharing one configuration.
///
/// Breakers are created on first use. [`reload`](Self::reload) swaps the
/// configuration and drops every existing breaker, so statistics start over
/// under the new settings. Handles obtained before a reload keep working on
/// their old window but are no longer returned by [`get`](Self::get).
///
/// # Example
///
/// ```rust
/// use tollgate_breaker::{BreakerConfig, BreakerGroup};
///
/// let group = BreakerGroup::new(BreakerConfig::default()).unwrap();
/// let a = group.get("10.0.0.1:9000");
/// let b = group.get("10.0.0.1:9000");
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// ```
pub struct BreakerGroup {
    state: RwLock<GroupState>,
}

struct GroupState {
    config: BreakerConfig,
    breakers: HashMap<String, Arc<Breaker>>,
}

impl BreakerGroup {
    /// Creates a group whose breakers use `config`.
    ///
    /// # Errors
    ///
    /// Fails if `config` does not validate.
    pub fn new(config: BreakerConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_validated(config.validate()?))
    }

    fn from_validated(config: BreakerConfig) -> Self {
        Self {
            state: RwLock::new(GroupState {
                config,
                breakers: HashMap::new(),
            }),
        }
    }

    /// Returns the breaker for `name`, creating it if needed.
    pub fn get(&self, name: &str) -> Arc<Breaker> {
        if let Some(breaker) = self.state.read().breakers.get(name) {
            return Arc::clone(breaker);
        }

        let mut guard = self.state.write();
        let GroupState { config, breakers } = &mut *guard;
        let breaker = breakers
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(Breaker::from_validated(name.to_owned(), config)));
        Arc::clone(breaker)
    }

    /// Replaces the configuration and discards all breakers.
    ///
    /// # Errors
    ///
    /// Fails if `config` does not validate, in which case the group is left
    /// untouched.
    pub fn reload(&self, config: BreakerConfig) -> Result<(), ConfigError> {
        let config = config.validate()?;
        self.reload_validated(config);
        Ok(())
    }

    fn reload_validated(&self, config: BreakerConfig) {
        let mut state = self.state.write();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            discarded = state.breakers.len(),
            k = config.k,
            window = ?config.window,
            buckets = config.buckets,
            request = config.request,
            "breaker group reloaded"
        );

        let capacity = state.breakers.len();
        state.config = config;
        state.breakers = HashMap::with_capacity(capacity);
    }

    /// Runs `run` if the breaker for `name` admits the call, `fallback`
    /// otherwise.
    ///
    /// The outcome of `run` is not reported back to the breaker; call
    /// [`Breaker::mark_success`] or [`Breaker::mark_failed`] on
    /// [`get(name)`](Self::get) for that, or use
    /// [`BreakerLayer`](crate::BreakerLayer).
    pub fn go<T, E, R, F>(&self, name: &str, run: R, fallback: F) -> Result<T, E>
    where
        R: FnOnce() -> Result<T, E>,
        F: FnOnce(BreakerError) -> Result<T, E>,
    {
        match self.get(name).allow() {
            Ok(()) => run(),
            Err(err) => fallback(err),
        }
    }

    /// A copy of the current configuration.
    pub fn config(&self) -> BreakerConfig {
        self.state.read().config.clone()
    }

    /// Number of breakers created so far.
    pub fn len(&self) -> usize {
        self.state.read().breakers.len()
    }

    /// Returns true if no breaker has been created yet.
    pub fn is_empty(&self) -> bool {
        self.state.read().breakers.is_empty()
    }
}

impl Default for BreakerGroup {
    /// A group using the process-wide default configuration.
    fn default() -> Self {
        Self::from_validated(default_config())
    }
}

impl fmt::Debug for BreakerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("BreakerGroup")
            .field("config", &state.config)
            .field("breakers", &state.breakers.len())
            .finish()
    }
}

static DEFAULT_CONFIG: LazyLock<RwLock<BreakerConfig>> =
    LazyLock::new(|| RwLock::new(BreakerConfig::default()));

static GLOBAL_GROUP: LazyLock<BreakerGroup> = LazyLock::new(BreakerGroup::default);

/// Sets the process-wide default configuration.
///
/// Groups created afterwards with [`BreakerGroup::default`] use it, and the
/// global group behind [`group`] and [`go`] is reloaded with it.
///
/// # Errors
///
/// Fails if `config` does not validate; the previous default stays in place.
pub fn init(config: BreakerConfig) -> Result<(), ConfigError> {
    let config = config.validate()?;
    *DEFAULT_CONFIG.write() = config.clone();
    GLOBAL_GROUP.reload_validated(config);
    Ok(())
}

/// The process-wide default configuration.
pub fn default_config() -> BreakerConfig {
    DEFAULT_CONFIG.read().clone()
}

/// The process-wide breaker group.
pub fn group() -> &'static BreakerGroup {
    &GLOBAL_GROUP
}

/// [`BreakerGroup::go`] on the process-wide group.
pub fn go<T, E, R, F>(name: &str, run: R, fallback: F) -> Result<T, E>
where
    R: FnOnce() -> Result<T, E>,
    F: FnOnce(BreakerError) -> Result<T, E>,
{
    GLOBAL_GROUP.go(name, run, fallback)
}
