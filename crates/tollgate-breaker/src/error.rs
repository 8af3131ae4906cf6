use thiserror::Error;
use tollgate_core::ResilienceError;

/// Returned by [`Breaker::allow`](crate::Breaker::allow) when a call is shed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BreakerError {
    /// The breaker rejected the call.
    #[error("service unavailable: breaker '{name}' rejected the call")]
    ServiceUnavailable {
        /// Name of the breaker that rejected the call.
        name: String,
    },
}

/// Convenience alias for breaker results.
pub type Result<T> = std::result::Result<T, BreakerError>;

/// Errors returned by the [`BreakerService`](crate::BreakerService).
#[derive(Debug, Error)]
pub enum BreakerServiceError<E> {
    /// The breaker shed the call; the inner service was not invoked.
    #[error(transparent)]
    Rejected(BreakerError),

    /// An error returned by the inner service.
    #[error("inner service error: {0}")]
    Inner(E),
}

impl<E> BreakerServiceError<E> {
    /// Returns true if the breaker rejected the call.
    pub fn is_rejected(&self) -> bool {
        matches!(self, BreakerServiceError::Rejected(_))
    }

    /// Returns the inner error if present.
    pub fn into_inner(self) -> Option<E> {
        match self {
            BreakerServiceError::Inner(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> From<BreakerError> for ResilienceError<E> {
    fn from(err: BreakerError) -> Self {
        match err {
            BreakerError::ServiceUnavailable { name } => ResilienceError::ServiceUnavailable {
                name: (!name.is_empty()).then_some(name),
            },
        }
    }
}

impl<E> From<BreakerServiceError<E>> for ResilienceError<E> {
    fn from(err: BreakerServiceError<E>) -> Self {
        match err {
            BreakerServiceError::Rejected(e) => e.into(),
            BreakerServiceError::Inner(e) => ResilienceError::Application(e),
        }
    }
}
