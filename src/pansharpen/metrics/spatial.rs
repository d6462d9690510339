use ndarray::{ArrayView2, Zip};

use crate::pansharpen::bands::BandStack;
use crate::pansharpen::common::error::Result;
use crate::pansharpen::common::stats::{covariance, floor_epsilon, mean, min_max, variance_about};
use crate::pansharpen::metrics::band_average;

fn mean_squared_error(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> f64 {
    let mut acc = 0.0;
    Zip::from(&a).and(&b).for_each(|&x, &y| acc += (x - y) * (x - y));
    acc / a.len() as f64
}

fn mean_absolute_error(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> f64 {
    let mut acc = 0.0;
    Zip::from(&a).and(&b).for_each(|&x, &y| acc += (x - y).abs());
    acc / a.len() as f64
}

/// Pearson correlation of two bands, clamped to `[-1, 1]`.
///
/// A constant band hits the epsilon floor and yields 0 rather than NaN.
pub fn band_correlation(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> f64 {
    let var_a = variance_about(a, mean(a));
    let var_b = variance_about(b, mean(b));
    let denom = floor_epsilon((var_a * var_b).sqrt(), "correlation denominator");
    (covariance(a, b) / denom).clamp(-1.0, 1.0)
}

/// `20·log10(max_val) − 10·log10(MSE)`, infinite for an exact match.
///
/// Without `max_val` the peak is the larger of the two bands' maxima.
pub fn band_psnr(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>, max_val: Option<f64>) -> f64 {
    let mse = mean_squared_error(a, b);
    if mse == 0.0 {
        return f64::INFINITY;
    }
    let peak = max_val.unwrap_or_else(|| min_max(a).1.max(min_max(b).1));
    20.0 * peak.log10() - 10.0 * mse.log10()
}

/// Mean per-band correlation coefficient; higher is better.
pub fn correlation_coefficient(candidate: &BandStack, reference: &BandStack) -> Result<f64> {
    band_average(candidate, reference, "correlation coefficient", band_correlation)
}

/// Mean per-band PSNR in dB; infinite if any band matches exactly.
pub fn psnr(candidate: &BandStack, reference: &BandStack, max_val: Option<f64>) -> Result<f64> {
    band_average(candidate, reference, "PSNR", |a, b| band_psnr(a, b, max_val))
}

pub fn mae(candidate: &BandStack, reference: &BandStack) -> Result<f64> {
    band_average(candidate, reference, "MAE", mean_absolute_error)
}

pub fn rmse(candidate: &BandStack, reference: &BandStack) -> Result<f64> {
    band_average(candidate, reference, "RMSE", |a, b| mean_squared_error(a, b).sqrt())
}
