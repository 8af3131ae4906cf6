//! Events emitted by the adaptive breaker.

use crate::BreakerState;
use std::time::Instant;
use tollgate_core::ResilienceEvent;

/// Events emitted by a [`Breaker`](crate::Breaker).
#[derive(Debug, Clone)]
pub enum BreakerEvent {
    /// The advisory state changed.
    StateTransition {
        /// Name of the breaker.
        pattern_name: String,
        /// When this event occurred.
        timestamp: Instant,
        /// Previous state.
        from: BreakerState,
        /// New state.
        to: BreakerState,
    },

    /// A call was shed.
    RequestRejected {
        /// Name of the breaker.
        pattern_name: String,
        /// When this event occurred.
        timestamp: Instant,
        /// Probability with which calls were being rejected.
        drop_ratio: f64,
    },
}

impl ResilienceEvent for BreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BreakerEvent::StateTransition { .. } => "state_transition",
            BreakerEvent::RequestRejected { .. } => "request_rejected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            BreakerEvent::StateTransition { timestamp, .. }
            | BreakerEvent::RequestRejected { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            BreakerEvent::StateTransition { pattern_name, .. }
            | BreakerEvent::RequestRejected { pattern_name, .. } => pattern_name,
        }
    }
}
