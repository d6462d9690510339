//! Closed-form Gram-Schmidt spectral sharpening
//!
//! A synthetic pan is built from the bands, the true pan is rescaled to the
//! synthetic pan's mean and standard deviation, and each band receives the
//! residual detail scaled by its covariance gain against the synthetic pan.

use ndarray::{Array2, Array3, Axis};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::pansharpen::bands::{synthesize, BandStack, PanImage, WeightVector};
use crate::pansharpen::common::error::Result;
use crate::pansharpen::common::stats::{covariance, floor_epsilon, mean, std_dev, variance_about};

/// Configuration for Gram-Schmidt fusion
#[derive(Debug, Clone, Default)]
pub struct GramSchmidtConfig {
    /// Synthetic pan weights; uniform `1/N` when unset
    pub weights: Option<WeightVector>,
}

impl GramSchmidtConfig {
    pub fn builder() -> GramSchmidtConfigBuilder {
        GramSchmidtConfigBuilder::default()
    }
}

/// Builder for GramSchmidtConfig
#[derive(Default)]
pub struct GramSchmidtConfigBuilder {
    weights: Option<WeightVector>,
}

impl GramSchmidtConfigBuilder {
    pub fn weights(mut self, weights: WeightVector) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn build(self) -> GramSchmidtConfig {
        GramSchmidtConfig {
            weights: self.weights,
        }
    }
}

/// Fused bands plus the per-band injection gains that produced them.
#[derive(Debug, Clone)]
pub struct GramSchmidtOutcome {
    pub bands: BandStack,
    pub gains: Vec<f64>,
}

pub struct GramSchmidtFusion {
    config: GramSchmidtConfig,
}

impl GramSchmidtFusion {
    pub fn new(config: GramSchmidtConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GramSchmidtConfig {
        &self.config
    }

    /// Sharpens `bands` with `pan`. Both must share the same spatial size.
    ///
    /// The output has the input's shape, negative values clipped to zero.
    #[instrument(skip_all, fields(bands = bands.band_count(), height = bands.height(), width = bands.width()))]
    pub fn fuse(&self, bands: &BandStack, pan: &PanImage) -> Result<GramSchmidtOutcome> {
        bands.ensure_matches_pan(pan, "Gram-Schmidt fusion")?;

        let weights = self
            .config
            .weights
            .clone()
            .unwrap_or_else(|| WeightVector::uniform(bands.band_count()));
        let synth = synthesize(bands, &weights)?;

        let pan_mean = mean(pan.view());
        let pan_std = floor_epsilon(std_dev(pan.view()), "panchromatic std");
        let synth_mean = mean(synth.view());
        let synth_std = std_dev(synth.view());
        debug!(pan_mean, pan_std, synth_mean, synth_std, "Pan statistics");

        let scale = synth_std / pan_std;
        let pan_adjusted = pan.as_array().mapv(|p| (p - pan_mean) * scale + synth_mean);
        let residual: Array2<f64> = &pan_adjusted - synth.as_array();

        let synth_var = floor_epsilon(variance_about(synth.view(), synth_mean), "synthetic pan variance");

        let injected: Vec<(f64, Array2<f64>)> = (0..bands.band_count())
            .into_par_iter()
            .map(|b| {
                let band = bands.band(b);
                let gain = covariance(band, synth.view()) / synth_var;
                let mut sharpened = band.to_owned();
                sharpened.scaled_add(gain, &residual);
                sharpened.mapv_inplace(|v| v.max(0.0));
                (gain, sharpened)
            })
            .collect();

        let (height, width) = bands.spatial_dim();
        let mut fused = Array3::zeros((bands.band_count(), height, width));
        let mut gains = Vec::with_capacity(injected.len());
        for (mut slot, (gain, sharpened)) in fused.axis_iter_mut(Axis(0)).zip(injected) {
            slot.assign(&sharpened);
            gains.push(gain);
        }

        info!(?gains, "Gram-Schmidt fusion complete");
        Ok(GramSchmidtOutcome {
            bands: BandStack::from_array_unchecked(fused),
            gains,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pansharpen::PansharpenError;
    use ndarray::array;

    fn blue() -> Array2<f64> {
        array![
            [12.0, 15.0, 20.0, 22.0],
            [14.0, 18.0, 25.0, 30.0],
            [11.0, 16.0, 28.0, 35.0],
            [10.0, 13.0, 24.0, 40.0],
        ]
    }

    #[test]
    fn test_noiseless_pan_gives_unit_gain_and_zero_residual() {
        // Second band is the first offset by 10, so with uniform weights the
        // synthetic pan is blue + 5 and both covariances equal its variance.
        let green = blue().mapv(|v| v + 10.0);
        let stack = BandStack::from_bands(vec![blue(), green]).unwrap();
        let pan = PanImage::new(array![
            [17.0, 20.0, 25.0, 27.0],
            [19.0, 23.0, 30.0, 35.0],
            [16.0, 21.0, 33.0, 40.0],
            [15.0, 18.0, 29.0, 45.0],
        ])
        .unwrap();

        let outcome = GramSchmidtFusion::new(GramSchmidtConfig::default())
            .fuse(&stack, &pan)
            .unwrap();

        assert_eq!(outcome.gains.len(), 2);
        for gain in &outcome.gains {
            assert!((gain - 1.0).abs() < 1e-12, "gain {gain}");
        }
        assert_eq!(outcome.bands.dim(), stack.dim());
        for (fused, original) in outcome.bands.as_array().iter().zip(stack.as_array().iter()) {
            assert!((fused - original).abs() < 1e-9);
        }
    }

    #[test]
    fn test_matching_weights_reproduce_input() {
        let weights = WeightVector::new(vec![0.3, 0.7]);
        let stack = BandStack::from_bands(vec![
            blue(),
            Array2::from_shape_fn((4, 4), |(r, c)| ((r * 5 + c * 3) % 9) as f64 + 2.0),
        ])
        .unwrap();
        let pan = synthesize(&stack, &weights).unwrap();

        let fusion = GramSchmidtFusion::new(GramSchmidtConfig::builder().weights(weights).build());
        let outcome = fusion.fuse(&stack, &pan).unwrap();
        for (fused, original) in outcome.bands.as_array().iter().zip(stack.as_array().iter()) {
            assert!((fused - original).abs() < 1e-9);
        }
    }

    #[test]
    fn test_tiny_radiances_keep_unit_gain() {
        // Same scene as the noiseless case, in reflectance-like units of 1e-6
        let band = blue().mapv(|v| v * 1e-6);
        let offset = band.mapv(|v| v + 10e-6);
        let stack = BandStack::from_bands(vec![band.clone(), offset]).unwrap();
        let pan = PanImage::new(band.mapv(|v| v + 5e-6)).unwrap();

        let outcome = GramSchmidtFusion::new(GramSchmidtConfig::default())
            .fuse(&stack, &pan)
            .unwrap();

        for gain in &outcome.gains {
            assert!((gain - 1.0).abs() < 1e-9, "gain {gain}");
        }
        for (fused, original) in outcome.bands.as_array().iter().zip(stack.as_array().iter()) {
            assert!((fused - original).abs() < 1e-15);
        }
    }

    #[test]
    fn test_tiny_radiances_with_matching_weights_reproduce_input() {
        let weights = WeightVector::new(vec![0.3, 0.7]);
        let stack = BandStack::from_bands(vec![
            blue().mapv(|v| v * 1e-6),
            Array2::from_shape_fn((4, 4), |(r, c)| (((r * 5 + c * 3) % 9) as f64 + 2.0) * 1e-6),
        ])
        .unwrap();
        let pan = synthesize(&stack, &weights).unwrap();

        let fusion = GramSchmidtFusion::new(GramSchmidtConfig::builder().weights(weights).build());
        let outcome = fusion.fuse(&stack, &pan).unwrap();
        for (fused, original) in outcome.bands.as_array().iter().zip(stack.as_array().iter()) {
            assert!((fused - original).abs() < 1e-15);
        }
    }

    #[test]
    fn test_gains_follow_covariance_ratio() {
        // synth = 1.5 * blue, so gains are 1/1.5 and 2/1.5
        let stack = BandStack::from_bands(vec![blue(), blue().mapv(|v| v * 2.0)]).unwrap();
        let pan = PanImage::new(blue().mapv(|v| v * 3.0 + 1.0)).unwrap();
        let outcome = GramSchmidtFusion::new(GramSchmidtConfig::default())
            .fuse(&stack, &pan)
            .unwrap();
        assert!((outcome.gains[0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((outcome.gains[1] - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_output_is_clipped_non_negative() {
        let stack = BandStack::from_bands(vec![array![[0.0, 1.0], [0.0, 1.0]]]).unwrap();
        // Pan detail opposite to the band pushes the zero pixels negative
        let pan = PanImage::new(array![[10.0, 0.0], [0.0, 10.0]]).unwrap();
        let outcome = GramSchmidtFusion::new(GramSchmidtConfig::default())
            .fuse(&stack, &pan)
            .unwrap();
        assert!(outcome.bands.as_array().iter().all(|&v| v >= 0.0));
        assert_eq!(outcome.bands.dim(), (1, 2, 2));
    }

    #[test]
    fn test_constant_pan_is_not_an_error() {
        let stack = BandStack::from_bands(vec![blue()]).unwrap();
        let pan = PanImage::new(Array2::from_elem((4, 4), 7.0)).unwrap();
        let outcome = GramSchmidtFusion::new(GramSchmidtConfig::default())
            .fuse(&stack, &pan)
            .unwrap();
        assert!(outcome.bands.as_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_shape_mismatch() {
        let stack = BandStack::from_bands(vec![blue()]).unwrap();
        let pan = PanImage::new(Array2::zeros((3, 4))).unwrap();
        let result = GramSchmidtFusion::new(GramSchmidtConfig::default()).fuse(&stack, &pan);
        assert!(matches!(result, Err(PansharpenError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_weight_count_mismatch() {
        let stack = BandStack::from_bands(vec![blue()]).unwrap();
        let pan = PanImage::new(blue()).unwrap();
        let fusion = GramSchmidtFusion::new(
            GramSchmidtConfig::builder().weights(WeightVector::uniform(2)).build(),
        );
        assert!(matches!(
            fusion.fuse(&stack, &pan),
            Err(PansharpenError::ShapeMismatch { context: "weight vector", .. })
        ));
    }
}
