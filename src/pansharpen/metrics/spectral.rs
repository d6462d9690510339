use ndarray::Array2;

use crate::pansharpen::bands::BandStack;
use crate::pansharpen::common::error::Result;
use crate::pansharpen::common::stats::{floor_epsilon, mean};
use crate::pansharpen::metrics::band_average;

/// Floor on the product of spectral vector norms.
const SAM_DENOM_FLOOR: f64 = 1e-8;
/// Floor applied to angles before the log visualization.
const SAM_MAP_FLOOR: f64 = 1e-6;

/// Spectral Angle Mapper output.
#[derive(Debug, Clone)]
pub struct SamResult {
    pub radians: f64,
    pub degrees: f64,
    /// Per-pixel angle in radians
    pub angles: Array2<f64>,
}

impl SamResult {
    pub fn visualization(&self) -> Array2<u8> {
        sam_visualization(&self.angles)
    }
}

/// Per-pixel angle between candidate and reference spectra, averaged.
pub fn sam(candidate: &BandStack, reference: &BandStack) -> Result<SamResult> {
    candidate.ensure_same_shape(reference, "SAM")?;

    let (height, width) = candidate.spatial_dim();
    let mut dot = Array2::<f64>::zeros((height, width));
    let mut norm_c = Array2::<f64>::zeros((height, width));
    let mut norm_r = Array2::<f64>::zeros((height, width));
    for (c, r) in candidate.bands().zip(reference.bands()) {
        dot += &(&c * &r);
        norm_c += &(&c * &c);
        norm_r += &(&r * &r);
    }

    let mut angles = dot;
    angles.zip_mut_with(&(norm_c.mapv(f64::sqrt) * norm_r.mapv(f64::sqrt)), |d, &n| {
        *d = (*d / n.max(SAM_DENOM_FLOOR)).clamp(-1.0, 1.0).acos();
    });

    let radians = angles.mean().unwrap_or(0.0);
    Ok(SamResult {
        radians,
        degrees: radians.to_degrees(),
        angles,
    })
}

/// Log-scaled 8-bit rendering of a SAM angle map.
///
/// Angles are floored at 1e-6, divided by their maximum, passed through
/// `log1p` and rescaled so the largest value maps to 255.
pub fn sam_visualization(angles: &Array2<f64>) -> Array2<u8> {
    let floored = angles.mapv(|a| a.max(SAM_MAP_FLOOR));
    let peak = floored.fold(SAM_MAP_FLOOR, |m, &a| m.max(a));
    let logged = floored.mapv(|a| (a / peak).ln_1p());
    let log_peak = logged.fold(0.0, |m: f64, &a| m.max(a));
    logged.mapv(|a| (a / log_peak * 255.0) as u8)
}

/// `100 · ratio · sqrt(mean_b((RMSE_b / mean(reference_b))²))`; lower is better.
pub fn ergas(candidate: &BandStack, reference: &BandStack, ratio: f64) -> Result<f64> {
    let mean_relative_sq = band_average(candidate, reference, "ERGAS", |c, r| {
        let mse = (&c - &r).mapv(|d| d * d).mean().unwrap_or(0.0);
        let reference_mean = floor_epsilon(mean(r), "reference band mean");
        mse / (reference_mean * reference_mean)
    })?;
    Ok(100.0 * ratio * mean_relative_sq.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pansharpen::PansharpenError;
    use ndarray::{array, Axis};

    fn stack() -> BandStack {
        BandStack::from_bands(vec![
            array![[10.0, 0.0], [3.0, 5.0]],
            array![[0.0, 10.0], [4.0, 5.0]],
        ])
        .unwrap()
    }

    #[test]
    fn test_sam_self_is_zero() {
        let result = sam(&stack(), &stack()).unwrap();
        assert!(result.radians.abs() < 1e-6);
        assert!(result.angles.iter().all(|&a| a.abs() < 1e-6));
    }

    #[test]
    fn test_sam_known_angles() {
        // pixel (0,0): (10,0) vs (0,10) is orthogonal; the others are unchanged
        let reference = stack();
        let mut swapped = reference.as_array().clone();
        swapped[[0, 0, 0]] = 0.0;
        swapped[[1, 0, 0]] = 10.0;
        let candidate = BandStack::new(swapped).unwrap();

        let result = sam(&candidate, &reference).unwrap();
        assert!((result.angles[[0, 0]] - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((result.radians - std::f64::consts::FRAC_PI_2 / 4.0).abs() < 1e-6);
        assert!((result.degrees - 22.5).abs() < 1e-4);
    }

    #[test]
    fn test_sam_zero_vectors_do_not_divide_by_zero() {
        let zeros = BandStack::new(ndarray::Array3::zeros((3, 2, 2))).unwrap();
        let result = sam(&zeros, &zeros).unwrap();
        assert!(result.angles.iter().all(|a| a.is_finite()));
    }

    #[test]
    fn test_sam_visualization_range() {
        let angles = array![[0.0, 0.1], [0.5, 1.0]];
        let vis = sam_visualization(&angles);
        assert_eq!(vis[[1, 1]], 255);
        assert_eq!(vis[[0, 0]], 0);
        assert!(vis[[0, 1]] < vis[[1, 0]]);
    }

    #[test]
    fn test_ergas_scales_linearly_with_ratio() {
        let reference = stack();
        let candidate = BandStack::new(reference.as_array().mapv(|v| v + 1.0)).unwrap();
        let single = ergas(&candidate, &reference, 2.0).unwrap();
        let double = ergas(&candidate, &reference, 4.0).unwrap();
        assert!(single > 0.0);
        assert_eq!(double, 2.0 * single);
    }

    #[test]
    fn test_ergas_value() {
        // RMSE 1 per band, band means 4.5 and 4.75
        let reference = stack();
        let candidate = BandStack::new(reference.as_array().mapv(|v| v + 1.0)).unwrap();
        let means: Vec<f64> = reference.as_array().axis_iter(Axis(0)).map(|b| b.mean().unwrap()).collect();
        let expected = 100.0 * 4.0 * ((1.0 / (means[0] * means[0]) + 1.0 / (means[1] * means[1])) / 2.0).sqrt();
        assert!((ergas(&candidate, &reference, 4.0).unwrap() - expected).abs() < 1e-9);
        assert_eq!(ergas(&reference, &reference, 4.0).unwrap(), 0.0);
    }

    #[test]
    fn test_ergas_shape_mismatch() {
        let other = BandStack::new(ndarray::Array3::zeros((1, 2, 2))).unwrap();
        assert!(matches!(ergas(&other, &stack(), 4.0), Err(PansharpenError::ShapeMismatch { .. })));
    }
}
