//! Quality assessment configuration types

use crate::pansharpen::common::error::{PansharpenError, Result};

/// Configuration for the metric suite
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Spatial resolution ratio between the multispectral and pan sources (ERGAS)
    pub ratio: f64,
    /// Fixed PSNR peak value when bands are not normalised; band maxima when unset
    pub data_range: Option<f64>,
    /// Min-max normalise each band before CC, PSNR, MAE and RMSE
    pub normalize: bool,
    /// Render the 8-bit SAM visualization into the report
    pub sam_map: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            ratio: 4.0,
            data_range: None,
            normalize: true,
            sam_map: false,
        }
    }
}

impl MetricsConfig {
    pub fn builder() -> MetricsConfigBuilder {
        MetricsConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.ratio.is_finite() || self.ratio <= 0.0 {
            return Err(PansharpenError::InvalidParameter(format!(
                "ratio must be finite and positive, got {}",
                self.ratio
            )));
        }
        if let Some(range) = self.data_range {
            if !range.is_finite() || range <= 0.0 {
                return Err(PansharpenError::InvalidParameter(format!(
                    "data_range must be finite and positive, got {range}"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for MetricsConfig
#[derive(Default)]
pub struct MetricsConfigBuilder {
    ratio: Option<f64>,
    data_range: Option<Option<f64>>,
    normalize: Option<bool>,
    sam_map: Option<bool>,
}

impl MetricsConfigBuilder {
    pub fn ratio(mut self, ratio: f64) -> Self {
        self.ratio = Some(ratio);
        self
    }

    pub fn data_range(mut self, data_range: Option<f64>) -> Self {
        self.data_range = Some(data_range);
        self
    }

    pub fn normalize(mut self, enable: bool) -> Self {
        self.normalize = Some(enable);
        self
    }

    pub fn sam_map(mut self, enable: bool) -> Self {
        self.sam_map = Some(enable);
        self
    }

    pub fn build(self) -> MetricsConfig {
        let default = MetricsConfig::default();
        MetricsConfig {
            ratio: self.ratio.unwrap_or(default.ratio),
            data_range: self.data_range.unwrap_or(default.data_range),
            normalize: self.normalize.unwrap_or(default.normalize),
            sam_map: self.sam_map.unwrap_or(default.sam_map),
        }
    }
}
