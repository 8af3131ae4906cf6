use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tollgate_core::SharedClock;

use crate::window::{Iter, Window};

/// Moves the write offset of a [`Window`] as time passes.
///
/// If the last write happened `n` bucket durations ago, the next write first
/// clears the `n` buckets following the current offset (all of them when
/// `n >= size`) and lands in the last one cleared. Reads never move the
/// offset; they skip the buckets that have expired but not yet been cleared.
#[derive(Debug)]
pub struct RollingPolicy {
    state: RwLock<PolicyState>,
    bucket_duration: Duration,
    clock: SharedClock,
}

#[derive(Debug)]
struct PolicyState {
    window: Window,
    offset: usize,
    last_append: Instant,
}

/// How far the clock has moved since the last write.
enum Elapsed {
    /// `spans` whole buckets (clamped to the window size) and the duration
    /// by which `last_append` should advance.
    Forward { spans: usize, advance: Duration },
    /// The clock went backwards.
    Backward,
}

impl RollingPolicy {
    /// Creates a policy over `window`. A zero `bucket_duration` is raised to
    /// one nanosecond.
    pub fn new(window: Window, bucket_duration: Duration, clock: SharedClock) -> Self {
        let last_append = clock.now();
        Self {
            state: RwLock::new(PolicyState {
                window,
                offset: 0,
                last_append,
            }),
            bucket_duration: bucket_duration.max(Duration::from_nanos(1)),
            clock,
        }
    }

    /// Accumulates `val` into the current bucket.
    pub fn add(&self, val: f64) {
        self.apply(val, Window::add);
    }

    /// Records `val` as a new point in the current bucket.
    pub fn append(&self, val: f64) {
        self.apply(val, Window::append);
    }

    /// Runs `f` over the buckets that are still inside the window, oldest
    /// first. Returns `R::default()` without calling `f` when every bucket
    /// has expired.
    pub fn reduce<F, R>(&self, f: F) -> R
    where
        F: FnOnce(Iter<'_>) -> R,
        R: Default,
    {
        let state = self.state.read();
        let size = state.window.size();
        let spans = match self.elapsed(state.last_append, size) {
            Elapsed::Forward { spans, .. } => spans,
            Elapsed::Backward => size,
        };

        let count = size - spans;
        if count == 0 {
            return R::default();
        }
        let offset = (state.offset + spans + 1) % size;
        f(state.window.iter(offset, count))
    }

    /// Number of whole buckets elapsed since the last write, at most the
    /// window size.
    pub fn timespan(&self) -> usize {
        let state = self.state.read();
        let size = state.window.size();
        match self.elapsed(state.last_append, size) {
            Elapsed::Forward { spans, .. } => spans,
            Elapsed::Backward => size,
        }
    }

    /// Number of buckets in the window.
    pub fn size(&self) -> usize {
        self.state.read().window.size()
    }

    /// Duration of one bucket.
    pub fn bucket_duration(&self) -> Duration {
        self.bucket_duration
    }

    fn apply(&self, val: f64, write: fn(&mut Window, usize, f64)) {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let size = state.window.size();

        match self.elapsed(state.last_append, size) {
            Elapsed::Forward { spans: 0, .. } => {}
            Elapsed::Forward { spans, advance } => {
                state.last_append += advance;
                Self::clear_ahead(state, spans);
            }
            Elapsed::Backward => {
                state.last_append = self.clock.now();
                Self::clear_ahead(state, size);
            }
        }

        write(&mut state.window, state.offset, val);
    }

    /// Clears the `spans` buckets after the current offset and moves the
    /// offset onto the last of them.
    fn clear_ahead(state: &mut PolicyState, spans: usize) {
        let size = state.window.size();
        for i in 1..=spans {
            state.window.reset_bucket(state.offset + i);
        }
        state.offset = (state.offset + spans) % size;
    }

    // Must be called with the state lock held so `last_append` cannot move
    // past the instant read here.
    fn elapsed(&self, last_append: Instant, size: usize) -> Elapsed {
        let now = self.clock.now();
        let Some(elapsed) = now.checked_duration_since(last_append) else {
            return Elapsed::Backward;
        };

        let bucket = self.bucket_duration.as_nanos();
        let spans = elapsed.as_nanos() / bucket;
        let remainder = Duration::from_nanos((elapsed.as_nanos() % bucket) as u64);

        Elapsed::Forward {
            spans: spans.min(size as u128) as usize,
            advance: elapsed - remainder,
        }
    }
}
