//! Least-squares estimate of spectral weights when the sensor response is unknown.

use ndarray::Zip;
use tracing::{debug, instrument};

use crate::pansharpen::bands::types::{BandStack, PanImage, WeightVector};
use crate::pansharpen::common::error::{PansharpenError, Result};

/// Pivot magnitude below which the normal equations are treated as singular.
const SINGULAR_PIVOT: f64 = 1e-12;

/// Regresses the panchromatic image on the bands (no intercept).
///
/// Solves the normal equations `(XᵀX) w = Xᵀy` with partial pivoting.
/// Linearly dependent bands give `InvalidParameter`.
#[instrument(skip_all, fields(bands = bands.band_count()))]
pub fn estimate_weights(bands: &BandStack, pan: &PanImage) -> Result<WeightVector> {
    bands.ensure_matches_pan(pan, "weight regression")?;
    let n = bands.band_count();

    // Augmented system [XᵀX | Xᵀy]
    let mut system = vec![vec![0.0; n + 1]; n];
    for i in 0..n {
        for j in i..n {
            let mut dot = 0.0;
            Zip::from(&bands.band(i))
                .and(&bands.band(j))
                .for_each(|&a, &b| dot += a * b);
            system[i][j] = dot;
            system[j][i] = dot;
        }
        let mut rhs = 0.0;
        Zip::from(&bands.band(i))
            .and(&pan.view())
            .for_each(|&a, &y| rhs += a * y);
        system[i][n] = rhs;
    }

    let scale = (0..n).map(|i| system[i][i].abs()).fold(0.0, f64::max).max(1.0);

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| system[a][col].abs().total_cmp(&system[b][col].abs()))
            .unwrap_or(col);
        if system[pivot_row][col].abs() < SINGULAR_PIVOT * scale {
            return Err(PansharpenError::InvalidParameter(
                "bands are linearly dependent, weights cannot be estimated".to_string(),
            ));
        }
        system.swap(col, pivot_row);

        let pivot = system[col][col];
        for value in system[col].iter_mut() {
            *value /= pivot;
        }
        let pivot_values = system[col].clone();
        for (row, values) in system.iter_mut().enumerate() {
            let factor = values[col];
            if row == col || factor == 0.0 {
                continue;
            }
            for (value, &p) in values.iter_mut().zip(&pivot_values).skip(col) {
                *value -= factor * p;
            }
        }
    }

    let weights: Vec<f64> = system.iter().map(|row| row[n]).collect();
    debug!(?weights, "Estimated spectral weights");
    Ok(WeightVector::new(weights))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pansharpen::bands::synthesize;
    use ndarray::Array2;

    #[test]
    fn test_recovers_known_weights() {
        let stack = BandStack::from_bands(vec![
            Array2::from_shape_fn((5, 6), |(r, c)| (r * 3 + c) as f64),
            Array2::from_shape_fn((5, 6), |(r, c)| ((r * c) % 7) as f64 + 1.0),
            Array2::from_shape_fn((5, 6), |(r, c)| ((r + 2 * c) % 5) as f64 * 2.0),
        ])
        .unwrap();
        let truth = WeightVector::new(vec![0.2, 0.5, 0.3]);
        let pan = synthesize(&stack, &truth).unwrap();

        let estimated = estimate_weights(&stack, &pan).unwrap();
        for (e, t) in estimated.iter().zip(truth.iter()) {
            assert!((e - t).abs() < 1e-9, "estimated {e}, expected {t}");
        }
    }

    #[test]
    fn test_dependent_bands_rejected() {
        let band = Array2::from_shape_fn((4, 4), |(r, c)| (r + c) as f64);
        let stack = BandStack::from_bands(vec![band.clone(), band.mapv(|v| v * 2.0)]).unwrap();
        let pan = PanImage::new(band).unwrap();
        assert!(matches!(
            estimate_weights(&stack, &pan),
            Err(PansharpenError::InvalidParameter(_))
        ));
    }
}
