//! Error types shared across tollgate.
//!
//! [`ResilienceError`] lets a client that uses both the pool and the breaker
//! carry a single error type. Each pattern crate provides a `From`
//! conversion from its own error into this one:
//!
//! ```rust
//! use tollgate_core::ResilienceError;
//!
//! #[derive(Debug)]
//! struct DialError;
//!
//! impl std::fmt::Display for DialError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "dial failed")
//!     }
//! }
//!
//! impl std::error::Error for DialError {}
//!
//! fn describe(err: &ResilienceError<DialError>) -> &'static str {
//!     match err {
//!         ResilienceError::PoolExhausted | ResilienceError::ServiceUnavailable { .. } => "shed",
//!         ResilienceError::PoolClosed => "shutting down",
//!         ResilienceError::Timeout { .. } => "slow",
//!         ResilienceError::Application(_) => "backend",
//!     }
//! }
//!
//! assert_eq!(describe(&ResilienceError::PoolExhausted), "shed");
//! ```
//!
//! [`ConfigError`] is returned by every constructor that validates its
//! configuration. Misconfiguration is reported once, when the pool or breaker
//! is built, and never surfaces from `get`, `put` or `allow`.

use std::fmt;
use std::time::Duration;

/// A unified error for callers composing the pool and the breaker.
#[derive(Debug, Clone)]
pub enum ResilienceError<E> {
    /// Waiting for a pooled item (or creating one) exceeded its deadline.
    Timeout {
        /// Component that timed out (e.g. `"pool"`).
        layer: &'static str,
    },

    /// The pool is at its active limit and was configured not to wait.
    PoolExhausted,

    /// The pool has been closed.
    PoolClosed,

    /// The breaker rejected the call.
    ServiceUnavailable {
        /// Breaker name, if it has one.
        name: Option<String>,
    },

    /// An error produced by the caller's own code (factory, service, ...).
    Application(E),
}

impl<E> fmt::Display for ResilienceError<E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResilienceError::Timeout { layer } => write!(f, "Timeout in {}", layer),
            ResilienceError::PoolExhausted => write!(f, "Pool exhausted"),
            ResilienceError::PoolClosed => write!(f, "Pool closed"),
            ResilienceError::ServiceUnavailable { name } => match name {
                Some(n) => write!(f, "Service unavailable: breaker '{}' rejected the call", n),
                None => write!(f, "Service unavailable"),
            },
            ResilienceError::Application(e) => write!(f, "Application error: {}", e),
        }
    }
}

impl<E> std::error::Error for ResilienceError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResilienceError::Application(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> ResilienceError<E> {
    /// Returns `true` for a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ResilienceError::Timeout { .. })
    }

    /// Returns `true` if the pool refused to hand out an item because of capacity.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, ResilienceError::PoolExhausted)
    }

    /// Returns `true` if the pool was closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, ResilienceError::PoolClosed)
    }

    /// Returns `true` if the breaker rejected the call.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ResilienceError::ServiceUnavailable { .. })
    }

    /// Returns `true` for an application error.
    pub fn is_application(&self) -> bool {
        matches!(self, ResilienceError::Application(_))
    }

    /// Extracts the application error, if any.
    pub fn application_error(self) -> Option<E> {
        match self {
            ResilienceError::Application(e) => Some(e),
            _ => None,
        }
    }

    /// Maps the application error.
    ///
    /// ```
    /// use tollgate_core::ResilienceError;
    ///
    /// let err: ResilienceError<String> = ResilienceError::Application("refused".to_string());
    /// let mapped: ResilienceError<usize> = err.map_application(|s| s.len());
    /// assert_eq!(mapped.application_error(), Some(7));
    /// ```
    pub fn map_application<F, T>(self, f: F) -> ResilienceError<T>
    where
        F: FnOnce(E) -> T,
    {
        match self {
            ResilienceError::Timeout { layer } => ResilienceError::Timeout { layer },
            ResilienceError::PoolExhausted => ResilienceError::PoolExhausted,
            ResilienceError::PoolClosed => ResilienceError::PoolClosed,
            ResilienceError::ServiceUnavailable { name } => {
                ResilienceError::ServiceUnavailable { name }
            }
            ResilienceError::Application(e) => ResilienceError::Application(f(e)),
        }
    }
}

/// A configuration rejected at construction time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The pool would keep more idle items than it may ever open.
    #[error("idle ({idle}) must not exceed active ({active})")]
    IdleExceedsActive {
        /// Configured active limit.
        active: usize,
        /// Configured idle limit.
        idle: isize,
    },

    /// The breaker's tolerance multiplier is negative or not finite.
    #[error("breaker multiplier k must be a positive finite number, got {0}")]
    InvalidMultiplier(f64),

    /// The window cannot be split into the requested number of buckets.
    #[error("window {window:?} is too short for {buckets} buckets")]
    BucketTooSmall {
        /// Total window duration.
        window: Duration,
        /// Requested bucket count.
        buckets: usize,
    },

    /// Background tasks need a Tokio runtime and none is running.
    #[error("no Tokio runtime is available to run background tasks")]
    NoRuntime,
}
