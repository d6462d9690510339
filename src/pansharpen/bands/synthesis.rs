use ndarray::{Array2, ArrayView3, Axis};
use tracing::instrument;

use crate::pansharpen::bands::types::{BandStack, PanImage, WeightVector};
use crate::pansharpen::common::error::Result;

/// Weighted per-pixel sum across the band axis.
///
/// Fails with `ShapeMismatch` when `weights` does not have one entry
/// per band. Deterministic: the same inputs always give bit-identical output.
#[instrument(level = "debug", skip_all, fields(bands = bands.band_count()))]
pub fn synthesize(bands: &BandStack, weights: &WeightVector) -> Result<PanImage> {
    weights.ensure_matches(bands.band_count())?;
    Ok(PanImage::from_array_unchecked(weighted_sum(
        bands.view(),
        weights.as_slice(),
    )))
}

/// Caller guarantees `weights.len()` equals the band count.
pub(crate) fn weighted_sum(bands: ArrayView3<'_, f64>, weights: &[f64]) -> Array2<f64> {
    let (_, height, width) = bands.dim();
    let mut pan = Array2::zeros((height, width));
    for (band, &weight) in bands.axis_iter(Axis(0)).zip(weights) {
        pan.scaled_add(weight, &band);
    }
    pan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pansharpen::PansharpenError;
    use ndarray::array;

    fn two_band_stack() -> BandStack {
        BandStack::from_bands(vec![
            array![[1.0, 2.0], [3.0, 4.0]],
            array![[10.0, 20.0], [30.0, 40.0]],
        ])
        .unwrap()
    }

    #[test]
    fn test_weighted_sum() {
        let pan = synthesize(&two_band_stack(), &WeightVector::new(vec![0.5, 0.1])).unwrap();
        assert_eq!(pan.as_array(), &array![[1.5, 3.0], [4.5, 6.0]]);
    }

    #[test]
    fn test_repeated_synthesis_is_bit_identical() {
        let stack = two_band_stack();
        let weights = WeightVector::new(vec![0.0842, 0.5375]);
        let first = synthesize(&stack, &weights).unwrap();
        let second = synthesize(&stack, &weights).unwrap();
        assert!(first
            .as_array()
            .iter()
            .zip(second.as_array().iter())
            .all(|(a, b)| a.to_bits() == b.to_bits()));
    }

    #[test]
    fn test_weight_count_mismatch() {
        let result = synthesize(&two_band_stack(), &WeightVector::uniform(3));
        assert!(matches!(
            result,
            Err(PansharpenError::ShapeMismatch { context: "weight vector", expected, found })
                if expected == [2] && found == [3]
        ));
    }
}
