//! Band statistics with the shared epsilon-floor policy.
//!
//! Variances, standard deviations and ranges that are exactly zero (or not
//! finite) are replaced by [`EPSILON`] instead of failing. Small but real
//! values pass through untouched, so statistics are scale invariant. The
//! substitution is reported as a `warn!` event so callers can treat the
//! result as low confidence.

use ndarray::{ArrayView2, Zip};
use tracing::warn;

/// Floor for variance, standard deviation, range and mean denominators.
pub const EPSILON: f64 = 1e-10;

pub fn mean(values: ArrayView2<'_, f64>) -> f64 {
    values.mean().unwrap_or(0.0)
}

/// Population variance around a precomputed mean.
pub fn variance_about(values: ArrayView2<'_, f64>, mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.fold(0.0, |acc, &v| acc + (v - mean) * (v - mean)) / values.len() as f64
}

pub fn std_dev(values: ArrayView2<'_, f64>) -> f64 {
    variance_about(values, mean(values)).sqrt()
}

/// Population covariance of two same-shaped rasters.
pub fn covariance(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> f64 {
    if a.is_empty() {
        return 0.0;
    }
    let (mean_a, mean_b) = (mean(a), mean(b));
    let mut acc = 0.0;
    Zip::from(&a).and(&b).for_each(|&x, &y| acc += (x - mean_a) * (y - mean_b));
    acc / a.len() as f64
}

/// Returns `(min, max)`; `(0, 0)` for an empty raster.
pub fn min_max(values: ArrayView2<'_, f64>) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Substitutes [`EPSILON`] for a zero or non-finite denominator.
pub fn floor_epsilon(value: f64, what: &str) -> f64 {
    if value == 0.0 || !value.is_finite() {
        warn!(quantity = what, value, "Degenerate input, substituting epsilon floor");
        EPSILON
    } else {
        value
    }
}
