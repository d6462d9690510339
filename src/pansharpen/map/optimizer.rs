use tracing::{debug, info, instrument};

use crate::pansharpen::bands::{BandStack, PanImage, WeightVector};
use crate::pansharpen::common::error::Result;
use crate::pansharpen::map::config::MapConfig;
use crate::pansharpen::map::energy::MapEnergyModel;

/// Iterations between gradient norm log lines
const LOG_EVERY: usize = 10;

/// Result of a MAP run.
///
/// `bands` is the final iterate clipped to non-negative values; the energies
/// are measured on the unclipped iterates.
#[derive(Debug, Clone)]
pub struct MapOutcome {
    pub bands: BandStack,
    pub iterations: usize,
    /// Frobenius norm of the full gradient at each iteration
    pub gradient_norms: Vec<f64>,
    pub initial_energy: f64,
    pub final_energy: f64,
}

impl MapOutcome {
    /// Last gradient norm, or `None` for a zero-iteration run.
    pub fn final_gradient_norm(&self) -> Option<f64> {
        self.gradient_norms.last().copied()
    }

    /// Final over initial gradient norm; the usual target is around 1e-3.
    pub fn gradient_reduction(&self) -> Option<f64> {
        match (self.gradient_norms.first(), self.gradient_norms.last()) {
            (Some(&first), Some(&last)) if first > 0.0 => Some(last / first),
            _ => None,
        }
    }
}

/// Fixed-step gradient descent over [`MapEnergyModel`], started at the
/// observed stack. Terminates on iteration count only.
pub struct MapOptimizer {
    config: MapConfig,
}

impl MapOptimizer {
    pub fn new(config: MapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    #[instrument(skip_all, fields(
        bands = observed.band_count(),
        height = observed.height(),
        width = observed.width(),
        iterations = self.config.max_iterations,
    ))]
    pub fn optimize(&self, observed: &BandStack, pan: &PanImage) -> Result<MapOutcome> {
        let config = &self.config;
        let weights = config
            .weights
            .clone()
            .unwrap_or_else(|| WeightVector::uniform(observed.band_count()));
        let model = MapEnergyModel::new(
            observed,
            pan,
            &weights,
            config.alpha,
            config.beta,
            config.blur_sigma,
        )?;

        let mut estimate = observed.as_array().clone();
        let initial_energy = model.terms_of(estimate.view()).total();
        let mut gradient_norms = Vec::with_capacity(config.max_iterations);

        for iteration in 0..config.max_iterations {
            let gradient = model.gradient_of(estimate.view());
            let norm = gradient.fold(0.0, |acc, &g| acc + g * g).sqrt();
            if iteration % LOG_EVERY == 0 {
                debug!(iteration, gradient_norm = norm, "MAP iteration");
            }
            estimate.scaled_add(-config.learning_rate, &gradient);
            gradient_norms.push(norm);
        }

        let final_energy = model.terms_of(estimate.view()).total();
        estimate.mapv_inplace(|v| v.max(0.0));

        let outcome = MapOutcome {
            bands: BandStack::from_array_unchecked(estimate),
            iterations: config.max_iterations,
            gradient_norms,
            initial_energy,
            final_energy,
        };
        info!(
            initial_energy,
            final_energy,
            gradient_reduction = ?outcome.gradient_reduction(),
            "MAP estimation complete"
        );
        Ok(outcome)
    }
}
