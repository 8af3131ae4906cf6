use crate::events::BreakerEvent;
use crate::BreakerState;
use std::fmt;
use std::time::Duration;
use tollgate_core::{ConfigError, EventListeners, FnListener, SharedClock};

pub(crate) const DEFAULT_K: f64 = 1.5;
pub(crate) const DEFAULT_WINDOW: Duration = Duration::from_secs(3);
pub(crate) const DEFAULT_BUCKETS: usize = 10;
pub(crate) const DEFAULT_REQUEST: u64 = 100;

/// Configuration shared by every breaker of a [`BreakerGroup`](crate::BreakerGroup).
///
/// Zero values stand for "use the default" and are filled in when the
/// configuration is validated, so a configuration deserialized from a file
/// with missing fields behaves like [`BreakerConfig::default`].
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BreakerConfig {
    pub(crate) switch_off: bool,
    pub(crate) k: f64,
    pub(crate) window: Duration,
    pub(crate) buckets: usize,
    pub(crate) request: u64,
    pub(crate) seed: Option<u64>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) clock: Option<SharedClock>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) event_listeners: EventListeners<BreakerEvent>,
}

impl BreakerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> BreakerConfigBuilder {
        BreakerConfigBuilder::new()
    }

    /// Fills in defaults for zero values and rejects what cannot be fixed.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidMultiplier`] if `k` is negative or not finite.
    /// - [`ConfigError::BucketTooSmall`] if `window / buckets` rounds down to
    ///   zero.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.k == 0.0 {
            self.k = DEFAULT_K;
        }
        if self.request == 0 {
            self.request = DEFAULT_REQUEST;
        }
        if self.buckets == 0 {
            self.buckets = DEFAULT_BUCKETS;
        }
        if self.window.is_zero() {
            self.window = DEFAULT_WINDOW;
        }

        if !self.k.is_finite() || self.k < 0.0 {
            return Err(ConfigError::InvalidMultiplier(self.k));
        }
        if self.bucket_duration().is_zero() {
            return Err(ConfigError::BucketTooSmall {
                window: self.window,
                buckets: self.buckets,
            });
        }
        Ok(self)
    }

    /// Whether the breaker is disabled.
    pub fn switch_off(&self) -> bool {
        self.switch_off
    }

    /// Tolerance multiplier.
    pub fn k(&self) -> f64 {
        self.k
    }

    /// Total sliding window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of buckets the window is split into.
    pub fn buckets(&self) -> usize {
        self.buckets
    }

    /// Minimum request volume before the breaker may reject.
    pub fn request(&self) -> u64 {
        self.request
    }

    pub(crate) fn bucket_duration(&self) -> Duration {
        u32::try_from(self.buckets)
            .ok()
            .and_then(|n| self.window.checked_div(n))
            .unwrap_or(Duration::ZERO)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            switch_off: false,
            k: DEFAULT_K,
            window: DEFAULT_WINDOW,
            buckets: DEFAULT_BUCKETS,
            request: DEFAULT_REQUEST,
            seed: None,
            clock: None,
            event_listeners: EventListeners::new(),
        }
    }
}

impl fmt::Debug for BreakerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreakerConfig")
            .field("switch_off", &self.switch_off)
            .field("k", &self.k)
            .field("window", &self.window)
            .field("buckets", &self.buckets)
            .field("request", &self.request)
            .field("seed", &self.seed)
            .field("listeners", &self.event_listeners.len())
            .finish()
    }
}

/// Builder for [`BreakerConfig`].
pub struct BreakerConfigBuilder {
    config: BreakerConfig,
}

impl BreakerConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            config: BreakerConfig::default(),
        }
    }

    /// Sets the tolerance multiplier.
    ///
    /// The breaker starts shedding once requests exceed `k` times the
    /// successes seen in the window. Lower values shed earlier; `k = 1`
    /// sheds as soon as any request fails.
    ///
    /// Default: 1.5
    pub fn k(mut self, k: f64) -> Self {
        self.config.k = k;
        self
    }

    /// Sets the sliding window duration.
    ///
    /// Default: 3 seconds
    pub fn window(mut self, window: Duration) -> Self {
        self.config.window = window;
        self
    }

    /// Sets how many buckets the window is split into.
    ///
    /// Default: 10
    pub fn buckets(mut self, buckets: usize) -> Self {
        self.config.buckets = buckets;
        self
    }

    /// Sets the minimum number of requests in the window before the breaker
    /// may reject anything.
    ///
    /// Default: 100
    pub fn request(mut self, request: u64) -> Self {
        self.config.request = request;
        self
    }

    /// Disables the breaker: every call is allowed.
    ///
    /// Default: false
    pub fn switch_off(mut self, off: bool) -> Self {
        self.config.switch_off = off;
        self
    }

    /// Seeds the random source used for probabilistic rejection, making
    /// rejection sequences reproducible. The breaker name is mixed in, so
    /// breakers of one group still decide independently of each other.
    ///
    /// Default: seeded from the OS
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Sets the clock that drives the rolling window.
    ///
    /// Default: the system monotonic clock
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.config.clock = Some(clock);
        self
    }

    /// Registers a callback for advisory state changes.
    ///
    /// # Example
    /// ```rust
    /// use tollgate_breaker::{BreakerConfig, BreakerState};
    ///
    /// let config = BreakerConfig::builder()
    ///     .on_state_transition(|from, to| {
    ///         if to == BreakerState::Open {
    ///             eprintln!("shedding load ({:?} -> {:?})", from, to);
    ///         }
    ///     })
    ///     .build()
    ///     .unwrap();
    /// # let _ = config;
    /// ```
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(BreakerState, BreakerState) + Send + Sync + 'static,
    {
        self.config
            .event_listeners
            .add(FnListener::new(move |event: &BreakerEvent| {
                if let BreakerEvent::StateTransition { from, to, .. } = event {
                    f(*from, *to);
                }
            }));
        self
    }

    /// Registers a callback for rejected calls. The callback receives the
    /// drop ratio in effect when the call was rejected.
    pub fn on_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.config
            .event_listeners
            .add(FnListener::new(move |event: &BreakerEvent| {
                if let BreakerEvent::RequestRejected { drop_ratio, .. } = event {
                    f(*drop_ratio);
                }
            }));
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// See [`BreakerConfig::validate`].
    pub fn build(self) -> Result<BreakerConfig, ConfigError> {
        self.config.validate()
    }
}

impl Default for BreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
