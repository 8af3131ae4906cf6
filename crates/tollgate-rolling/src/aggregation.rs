//! Reducers over a run of buckets.
//!
//! Each function consumes the iterator handed to
//! [`RollingPolicy::reduce`](crate::RollingPolicy::reduce). Empty input
//! yields `0.0`.

use crate::window::Iter;

/// Sum of every point.
pub fn sum(iter: Iter<'_>) -> f64 {
    iter.flat_map(|bucket| bucket.points()).sum()
}

/// Mean of every point.
pub fn avg(iter: Iter<'_>) -> f64 {
    let (total, n) = iter
        .flat_map(|bucket| bucket.points())
        .fold((0.0, 0usize), |(total, n), p| (total + p, n + 1));
    if n == 0 {
        0.0
    } else {
        total / n as f64
    }
}

/// Smallest point.
pub fn min(iter: Iter<'_>) -> f64 {
    iter.flat_map(|bucket| bucket.points())
        .copied()
        .reduce(f64::min)
        .unwrap_or(0.0)
}

/// Largest point.
pub fn max(iter: Iter<'_>) -> f64 {
    iter.flat_map(|bucket| bucket.points())
        .copied()
        .reduce(f64::max)
        .unwrap_or(0.0)
}

/// Total number of observations.
pub fn count(iter: Iter<'_>) -> f64 {
    iter.map(|bucket| bucket.count() as f64).sum()
}
