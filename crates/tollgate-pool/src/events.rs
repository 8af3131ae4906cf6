//! Events emitted by the resource pool.

use std::time::{Duration, Instant};
use tollgate_core::ResilienceEvent;

/// Events emitted by a [`Pool`](crate::Pool).
#[derive(Debug, Clone)]
pub enum PoolEvent {
    /// The factory created a new item.
    ItemCreated {
        pattern_name: String,
        timestamp: Instant,
        /// Items open after the creation, idle or checked out.
        active: usize,
    },

    /// A checkout was served from the free list.
    ItemReused {
        pattern_name: String,
        timestamp: Instant,
        /// How long the item sat in the free list.
        idle_for: Duration,
    },

    /// An idle item outlived the idle timeout and was closed.
    ItemEvicted {
        pattern_name: String,
        timestamp: Instant,
        idle_for: Duration,
    },

    /// A checkout failed because every item was in use and waiting is disabled.
    Exhausted {
        pattern_name: String,
        timestamp: Instant,
        /// The configured active limit.
        max_active: usize,
    },

    /// A waiting checkout gave up.
    WaitTimedOut {
        pattern_name: String,
        timestamp: Instant,
        waited: Duration,
    },

    /// The pool was closed.
    Closed {
        pattern_name: String,
        timestamp: Instant,
    },
}

impl ResilienceEvent for PoolEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PoolEvent::ItemCreated { .. } => "item_created",
            PoolEvent::ItemReused { .. } => "item_reused",
            PoolEvent::ItemEvicted { .. } => "item_evicted",
            PoolEvent::Exhausted { .. } => "exhausted",
            PoolEvent::WaitTimedOut { .. } => "wait_timed_out",
            PoolEvent::Closed { .. } => "closed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            PoolEvent::ItemCreated { timestamp, .. }
            | PoolEvent::ItemReused { timestamp, .. }
            | PoolEvent::ItemEvicted { timestamp, .. }
            | PoolEvent::Exhausted { timestamp, .. }
            | PoolEvent::WaitTimedOut { timestamp, .. }
            | PoolEvent::Closed { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            PoolEvent::ItemCreated { pattern_name, .. }
            | PoolEvent::ItemReused { pattern_name, .. }
            | PoolEvent::ItemEvicted { pattern_name, .. }
            | PoolEvent::Exhausted { pattern_name, .. }
            | PoolEvent::WaitTimedOut { pattern_name, .. }
            | PoolEvent::Closed { pattern_name, .. } => pattern_name,
        }
    }
}
