//! MAP optimizer configuration types

use crate::pansharpen::bands::WeightVector;
use crate::pansharpen::common::error::{PansharpenError, Result};

/// Configuration for MAP estimation
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Spectral weights of the pan consistency term; uniform `1/N` when unset
    pub weights: Option<WeightVector>,
    /// Smoothness prior strength
    pub alpha: f64,
    /// Data fidelity and pan consistency strength
    pub beta: f64,
    /// Gaussian sigma (pixels) simulating the sensor's spatial response
    pub blur_sigma: f64,
    /// Fixed gradient descent step
    pub learning_rate: f64,
    /// Iteration budget; the only termination condition
    pub max_iterations: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            weights: None,
            alpha: 0.001,
            beta: 1.0,
            blur_sigma: 1.2,
            learning_rate: 0.05,
            max_iterations: 50,
        }
    }
}

impl MapConfig {
    pub fn builder() -> MapConfigBuilder {
        MapConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("blur_sigma", self.blur_sigma),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(PansharpenError::InvalidParameter(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(PansharpenError::InvalidParameter(format!(
                "learning_rate must be finite and positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Builder for MapConfig
#[derive(Default)]
pub struct MapConfigBuilder {
    weights: Option<WeightVector>,
    alpha: Option<f64>,
    beta: Option<f64>,
    blur_sigma: Option<f64>,
    learning_rate: Option<f64>,
    max_iterations: Option<usize>,
}

impl MapConfigBuilder {
    pub fn weights(mut self, weights: WeightVector) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn beta(mut self, beta: f64) -> Self {
        self.beta = Some(beta);
        self
    }

    pub fn blur_sigma(mut self, sigma: f64) -> Self {
        self.blur_sigma = Some(sigma);
        self
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = Some(learning_rate);
        self
    }

    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    pub fn build(self) -> MapConfig {
        let default = MapConfig::default();
        MapConfig {
            weights: self.weights.or(default.weights),
            alpha: self.alpha.unwrap_or(default.alpha),
            beta: self.beta.unwrap_or(default.beta),
            blur_sigma: self.blur_sigma.unwrap_or(default.blur_sigma),
            learning_rate: self.learning_rate.unwrap_or(default.learning_rate),
            max_iterations: self.max_iterations.unwrap_or(default.max_iterations),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = MapConfig::builder()
            .alpha(0.01)
            .learning_rate(0.1)
            .max_iterations(5)
            .build();

        assert_eq!(config.alpha, 0.01);
        assert_eq!(config.beta, 1.0);
        assert_eq!(config.blur_sigma, 1.2);
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.max_iterations, 5);
        assert!(config.weights.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_parameters() {
        assert!(MapConfig::builder().alpha(-1.0).build().validate().is_err());
        assert!(MapConfig::builder().blur_sigma(f64::NAN).build().validate().is_err());
        assert!(MapConfig::builder().learning_rate(0.0).build().validate().is_err());
        assert!(MapConfig::builder().beta(0.0).build().validate().is_ok());
    }
}
