//! Core infrastructure for tollgate.
//!
//! This crate provides the pieces shared by the resource pool and the
//! adaptive breaker:
//! - Event system for observability
//! - A unified error type for composing both subsystems
//! - Configuration errors raised at construction time
//! - An injectable monotonic clock

pub mod clock;
pub mod error;
pub mod events;

pub use clock::{Clock, ManualClock, MonotonicClock, SharedClock};
pub use error::{ConfigError, ResilienceError};
pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
