//! Stress tests for tollgate
//!
//! These tests push the components to their limits to validate behavior
//! under extreme conditions. They are marked with `#[ignore]` and must be
//! run explicitly:
//!
//! ```bash
//! # Run all stress tests
//! cargo test --test stress -- --ignored
//!
//! # Run only the pool
//! cargo test --test stress pool -- --ignored
//! ```
//!
//! ## What We Test
//!
//! - **High volume**: Millions of admission decisions and outcome marks
//! - **High concurrency**: Hundreds of tasks contending for a small pool
//! - **State consistency**: Counts add up once the load stops

pub mod breaker;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Utility: Track peak concurrent operations
pub struct ConcurrencyTracker {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    pub fn enter(&self) {
        let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
    }

    pub fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}
