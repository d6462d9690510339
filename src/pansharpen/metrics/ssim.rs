//! Structural similarity on min-max normalised bands.

use ndarray::{s, Array2, ArrayView2, Zip};

use crate::pansharpen::bands::BandStack;
use crate::pansharpen::common::error::Result;
use crate::pansharpen::common::stats::{covariance, mean, variance_about};
use crate::pansharpen::filters::box_filter;
use crate::pansharpen::metrics::band_average;
use crate::pansharpen::metrics::suite::normalize_band;

const WINDOW: usize = 7;
const K1: f64 = 0.01;
const K2: f64 = 0.03;

/// Largest odd window not exceeding [`WINDOW`] or either image side.
fn window_size(height: usize, width: usize) -> usize {
    let size = WINDOW.min(height).min(width);
    if size % 2 == 0 { size - 1 } else { size }
}

fn ssim_index(mu_a: f64, mu_b: f64, var_a: f64, var_b: f64, cov: f64, c1: f64, c2: f64) -> f64 {
    ((2.0 * mu_a * mu_b + c1) * (2.0 * cov + c2))
        / ((mu_a * mu_a + mu_b * mu_b + c1) * (var_a + var_b + c2))
}

/// Mean SSIM of two bands with a known data range.
///
/// Local statistics come from a 7x7 uniform window with sample covariance;
/// the mean excludes the half-window border. Images too small for a 3x3
/// window fall back to a single whole-image window.
pub fn band_ssim(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>, data_range: f64) -> f64 {
    let c1 = (K1 * data_range).powi(2);
    let c2 = (K2 * data_range).powi(2);
    let (height, width) = a.dim();
    let win = window_size(height, width);

    if win < 3 {
        let n = a.len() as f64;
        let sample = if n > 1.0 { n / (n - 1.0) } else { 1.0 };
        let (mu_a, mu_b) = (mean(a), mean(b));
        return ssim_index(
            mu_a,
            mu_b,
            sample * variance_about(a, mu_a),
            sample * variance_about(b, mu_b),
            sample * covariance(a, b),
            c1,
            c2,
        );
    }

    let samples = (win * win) as f64;
    let cov_norm = samples / (samples - 1.0);

    let mu_a = box_filter(a, win);
    let mu_b = box_filter(b, win);
    let aa = box_filter((&a * &a).view(), win);
    let bb = box_filter((&b * &b).view(), win);
    let ab = box_filter((&a * &b).view(), win);

    let mut map = Array2::zeros((height, width));
    Zip::from(&mut map)
        .and(&mu_a)
        .and(&mu_b)
        .and(&aa)
        .and(&bb)
        .and(&ab)
        .for_each(|out, &ma, &mb, &saa, &sbb, &sab| {
            let var_a = cov_norm * (saa - ma * ma);
            let var_b = cov_norm * (sbb - mb * mb);
            let cov = cov_norm * (sab - ma * mb);
            *out = ssim_index(ma, mb, var_a, var_b, cov, c1, c2);
        });

    let pad = (win - 1) / 2;
    map.slice(s![pad..height - pad, pad..width - pad])
        .mean()
        .unwrap_or(1.0)
}

/// Mean per-band SSIM after band-wise min-max normalisation to `[0, 1]`.
pub fn ssim(candidate: &BandStack, reference: &BandStack) -> Result<f64> {
    band_average(candidate, reference, "SSIM", |a, b| {
        band_ssim(normalize_band(a).view(), normalize_band(b).view(), 1.0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(height: usize, width: usize) -> Array2<f64> {
        Array2::from_shape_fn((height, width), |(r, c)| ((r * 7 + c * 13) % 17) as f64)
    }

    #[test]
    fn test_window_size() {
        assert_eq!(window_size(100, 100), 7);
        assert_eq!(window_size(6, 100), 5);
        assert_eq!(window_size(4, 4), 3);
        assert_eq!(window_size(2, 9), 1);
    }

    #[test]
    fn test_identical_bands_score_one() {
        let band = texture(12, 10);
        let stack = BandStack::from_bands(vec![band.clone(), band.mapv(|v| 20.0 - v)]).unwrap();
        assert!((ssim(&stack, &stack).unwrap() - 1.0).abs() < 1e-12);

        let tiny = texture(2, 2);
        assert!((band_ssim(tiny.view(), tiny.view(), 1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_noise_lowers_similarity() {
        let band = texture(16, 16);
        let noisy = Array2::from_shape_fn((16, 16), |(r, c)| {
            band[[r, c]] + if (r * 3 + c) % 4 == 0 { 6.0 } else { -2.0 }
        });
        let clean = BandStack::from_bands(vec![band]).unwrap();
        let degraded = BandStack::from_bands(vec![noisy]).unwrap();
        let score = ssim(&degraded, &clean).unwrap();
        assert!(score < 0.99 && score > -1.0, "score {score}");
    }

    #[test]
    fn test_normalisation_makes_ssim_scale_invariant() {
        let band = texture(9, 9);
        let a = BandStack::from_bands(vec![band.clone()]).unwrap();
        let b = BandStack::from_bands(vec![band.mapv(|v| v * 40.0 + 100.0)]).unwrap();
        assert!((ssim(&a, &b).unwrap() - 1.0).abs() < 1e-9);
    }
}
