use crate::config::BreakerConfig;
use crate::error::BreakerError;
use crate::events::BreakerEvent;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;
use tollgate_core::{ConfigError, EventListeners, MonotonicClock};
use tollgate_rolling::RollingCounter;

/// Advisory state of a [`Breaker`].
///
/// The state is a label for observability only. Admission is decided from
/// the rolling statistics on every call, and an `Open` breaker still lets a
/// share of the traffic through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum BreakerState {
    /// Requests are admitted.
    Closed = 0,
    /// Requests are shed with the current drop ratio.
    Open = 1,
}

impl BreakerState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => BreakerState::Open,
            _ => BreakerState::Closed,
        }
    }

    /// Lowercase name, as used in metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
        }
    }
}

/// Point-in-time view of a breaker's window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakerMetrics {
    /// Advisory state.
    pub state: BreakerState,
    /// Successful calls in the window.
    pub successes: u64,
    /// All calls marked in the window.
    pub total: u64,
    /// Probability that the next call is rejected.
    pub drop_ratio: f64,
}

/// An adaptive load-shedding breaker.
///
/// Every outcome is recorded into a rolling window: a success adds `1`, a
/// failure adds `0`. [`allow`](Self::allow) reads `successes` and `total`
/// from the window and admits the call outright while
/// `total < request` or `total < k * successes`. Beyond that it rejects with
/// probability
///
/// ```text
/// max(0, (total - k * successes) / (total + 1))
/// ```
///
/// so some traffic always reaches the backend and the breaker recovers on
/// its own as the success rate improves.
///
/// # Example
///
/// ```rust
/// use tollgate_breaker::{Breaker, BreakerConfig};
///
/// let breaker = Breaker::new("user-api", &BreakerConfig::default()).unwrap();
///
/// match breaker.allow() {
///     Ok(()) => {
///         // issue the call, then report how it went
///         breaker.mark_success();
///     }
///     Err(err) => eprintln!("{err}"),
/// }
/// ```
pub struct Breaker {
    name: String,
    stat: RollingCounter,
    k: f64,
    request: u64,
    switch_off: bool,
    state: AtomicU8,
    rng: Mutex<StdRng>,
    event_listeners: EventListeners<BreakerEvent>,
}

/// Derives a per-breaker seed so breakers sharing a seeded config draw
/// independent rejection sequences.
fn mix_seed(seed: u64, name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    (seed, name).hash(&mut hasher);
    hasher.finish()
}

impl Breaker {
    /// Creates a breaker named `name`.
    ///
    /// # Errors
    ///
    /// Fails if `config` does not validate; see [`BreakerConfig::validate`].
    pub fn new(name: impl Into<String>, config: &BreakerConfig) -> Result<Self, ConfigError> {
        let config = config.clone().validate()?;
        Ok(Self::from_validated(name.into(), &config))
    }

    pub(crate) fn from_validated(name: String, config: &BreakerConfig) -> Self {
        #[cfg(feature = "metrics")]
        {
            crate::describe_metrics();
            gauge!("breaker_state", "breaker" => name.clone()).set(0.0);
        }

        let clock = config.clock.clone().unwrap_or_else(MonotonicClock::shared);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(mix_seed(seed, &name)),
            None => StdRng::from_os_rng(),
        };

        Self {
            stat: RollingCounter::with_clock(config.buckets, config.bucket_duration(), clock),
            k: config.k,
            request: config.request,
            switch_off: config.switch_off,
            state: AtomicU8::new(BreakerState::Closed as u8),
            rng: Mutex::new(rng),
            event_listeners: config.event_listeners.clone(),
            name,
        }
    }

    /// Name the breaker was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decides whether the next call may proceed.
    ///
    /// # Errors
    ///
    /// Returns [`BreakerError::ServiceUnavailable`] when the call is shed.
    pub fn allow(&self) -> Result<(), BreakerError> {
        if self.switch_off {
            return Ok(());
        }

        let (successes, total) = self.summary();
        let threshold = self.k * successes;

        if total < self.request || (total as f64) < threshold {
            self.transition(BreakerState::Open, BreakerState::Closed);
            self.record_admission(true);
            return Ok(());
        }

        self.transition(BreakerState::Closed, BreakerState::Open);
        let drop_ratio = drop_ratio(total, threshold);
        if self.drop_on_ratio(drop_ratio) {
            #[cfg(feature = "tracing")]
            tracing::trace!(breaker = %self.name, total, successes, drop_ratio, "call rejected");

            self.record_admission(false);
            self.event_listeners
                .emit_with(|| BreakerEvent::RequestRejected {
                    pattern_name: self.name.clone(),
                    timestamp: Instant::now(),
                    drop_ratio,
                });
            return Err(BreakerError::ServiceUnavailable {
                name: self.name.clone(),
            });
        }

        self.record_admission(true);
        Ok(())
    }

    /// Records a successful call.
    pub fn mark_success(&self) {
        self.stat.add(1);

        #[cfg(feature = "metrics")]
        counter!("breaker_marks_total", "breaker" => self.name.clone(), "outcome" => "success")
            .increment(1);
    }

    /// Records a failed call. It counts towards the total but not the
    /// successes.
    pub fn mark_failed(&self) {
        self.stat.add(0);

        #[cfg(feature = "metrics")]
        counter!("breaker_marks_total", "breaker" => self.name.clone(), "outcome" => "failure")
            .increment(1);
    }

    /// Current advisory state.
    pub fn state(&self) -> BreakerState {
        BreakerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns a snapshot of the window.
    pub fn metrics(&self) -> BreakerMetrics {
        let (successes, total) = self.summary();
        let threshold = self.k * successes;
        let shedding = !self.switch_off && total >= self.request && (total as f64) >= threshold;
        let drop_ratio = if shedding {
            drop_ratio(total, threshold)
        } else {
            0.0
        };

        BreakerMetrics {
            state: self.state(),
            successes: successes as u64,
            total,
            drop_ratio,
        }
    }

    /// Returns `(successes, total)` over the live window.
    pub(crate) fn summary(&self) -> (f64, u64) {
        self.stat.reduce(|buckets| {
            buckets.fold((0.0, 0u64), |(successes, total), bucket| {
                (
                    successes + bucket.points().iter().sum::<f64>(),
                    total + bucket.count() as u64,
                )
            })
        })
    }

    pub(crate) fn drop_on_ratio(&self, ratio: f64) -> bool {
        self.rng.lock().random::<f64>() < ratio
    }

    fn transition(&self, from: BreakerState, to: BreakerState) {
        if self
            .state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::info!(breaker = %self.name, from = from.as_str(), to = to.as_str(), "breaker state transition");

        #[cfg(feature = "metrics")]
        {
            counter!(
                "breaker_transitions_total",
                "breaker" => self.name.clone(),
                "from" => from.as_str(),
                "to" => to.as_str()
            )
            .increment(1);
            gauge!("breaker_state", "breaker" => self.name.clone()).set(to as u8 as f64);
        }

        self.event_listeners
            .emit_with(|| BreakerEvent::StateTransition {
                pattern_name: self.name.clone(),
                timestamp: Instant::now(),
                from,
                to,
            });
    }

    #[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
    fn record_admission(&self, allowed: bool) {
        #[cfg(feature = "metrics")]
        counter!(
            "breaker_requests_total",
            "breaker" => self.name.clone(),
            "outcome" => if allowed { "allowed" } else { "rejected" }
        )
        .increment(1);
    }
}

fn drop_ratio(total: u64, threshold: f64) -> f64 {
    let total = total as f64;
    ((total - threshold) / (total + 1.0)).max(0.0)
}

impl fmt::Debug for Breaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Breaker")
            .field("name", &self.name)
            .field("k", &self.k)
            .field("request", &self.request)
            .field("switch_off", &self.switch_off)
            .field("state", &self.state())
            .finish()
    }
}
