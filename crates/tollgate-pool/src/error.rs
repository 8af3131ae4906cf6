//! Error types for the resource pool.

use thiserror::Error;
use tollgate_core::ResilienceError;

/// Errors returned by [`Pool`](crate::Pool) operations.
///
/// `E` is the error type of the pool's [`Factory`](crate::Factory).
#[derive(Debug, Error)]
pub enum PoolError<E> {
    /// Every item is checked out and the pool is not allowed to wait.
    #[error("pool exhausted")]
    Exhausted,

    /// The pool has been closed.
    #[error("pool closed")]
    Closed,

    /// The wait deadline elapsed before an item became available.
    #[error("timed out waiting for a pooled item")]
    Timeout,

    /// The factory failed to create an item.
    #[error("failed to create item: {0}")]
    Create(E),

    /// The factory failed to close an item.
    #[error("failed to close item: {0}")]
    Close(E),
}

impl<E> PoolError<E> {
    /// Returns true if the pool had no capacity left.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, PoolError::Exhausted)
    }

    /// Returns true if the pool was closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, PoolError::Closed)
    }

    /// Returns true if waiting for an item timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, PoolError::Timeout)
    }

    /// Returns the factory error, if any.
    pub fn into_factory_error(self) -> Option<E> {
        match self {
            PoolError::Create(e) | PoolError::Close(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> From<PoolError<E>> for ResilienceError<E> {
    fn from(err: PoolError<E>) -> Self {
        match err {
            PoolError::Exhausted => ResilienceError::PoolExhausted,
            PoolError::Closed => ResilienceError::PoolClosed,
            PoolError::Timeout => ResilienceError::Timeout { layer: "pool" },
            PoolError::Create(e) | PoolError::Close(e) => ResilienceError::Application(e),
        }
    }
}
