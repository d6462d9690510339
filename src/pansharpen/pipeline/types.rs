//! Pipeline configuration and output types

use ndarray::Array3;

use crate::pansharpen::bands::BandStack;
use crate::pansharpen::common::error::{PansharpenError, Result};
use crate::pansharpen::gram_schmidt::GramSchmidtConfig;
use crate::pansharpen::map::MapConfig;
use crate::pansharpen::metrics::{MetricReport, MetricsConfig};
use crate::pansharpen::raster::TiffCompression;

/// Fusion algorithm and its parameters
#[derive(Debug, Clone)]
pub enum FusionMethod {
    GramSchmidt(GramSchmidtConfig),
    Map(MapConfig),
}

impl Default for FusionMethod {
    fn default() -> Self {
        FusionMethod::GramSchmidt(GramSchmidtConfig::default())
    }
}

impl FusionMethod {
    pub fn name(&self) -> &'static str {
        match self {
            FusionMethod::GramSchmidt(_) => "gram-schmidt",
            FusionMethod::Map(_) => "map",
        }
    }
}

/// Configuration for a fusion run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Fusion algorithm
    pub method: FusionMethod,
    /// Metric suite settings, used only when a reference is supplied
    pub metrics: MetricsConfig,
    /// Upper clip bound of the quantized output
    pub output_max: u16,
    /// Compression of written rasters
    pub compression: TiffCompression,
    /// Central `(height, width)` window applied to every input before fusion
    pub crop: Option<(usize, usize)>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            method: FusionMethod::default(),
            metrics: MetricsConfig::default(),
            output_max: u16::MAX,
            compression: TiffCompression::None,
            crop: None,
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if let FusionMethod::Map(map) = &self.method {
            map.validate()?;
        }
        self.metrics.validate()?;
        if let Some((height, width)) = self.crop {
            if height == 0 || width == 0 {
                return Err(PansharpenError::InvalidParameter(format!(
                    "crop window must be non-empty, got {height}x{width}"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for PipelineConfig
#[derive(Default)]
pub struct PipelineConfigBuilder {
    method: Option<FusionMethod>,
    metrics: Option<MetricsConfig>,
    output_max: Option<u16>,
    compression: Option<TiffCompression>,
    crop: Option<Option<(usize, usize)>>,
}

impl PipelineConfigBuilder {
    pub fn method(mut self, method: FusionMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn output_max(mut self, max: u16) -> Self {
        self.output_max = Some(max);
        self
    }

    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn crop(mut self, crop: Option<(usize, usize)>) -> Self {
        self.crop = Some(crop);
        self
    }

    pub fn build(self) -> PipelineConfig {
        let default = PipelineConfig::default();
        PipelineConfig {
            method: self.method.unwrap_or(default.method),
            metrics: self.metrics.unwrap_or(default.metrics),
            output_max: self.output_max.unwrap_or(default.output_max),
            compression: self.compression.unwrap_or(default.compression),
            crop: self.crop.unwrap_or(default.crop),
        }
    }
}

/// Per-method byproducts of a fusion run
#[derive(Debug, Clone)]
pub enum FusionDiagnostics {
    GramSchmidt {
        gains: Vec<f64>,
    },
    Map {
        iterations: usize,
        gradient_norms: Vec<f64>,
        initial_energy: f64,
        final_energy: f64,
    },
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Fused bands before quantization
    pub fused: BandStack,
    /// Fused bands clipped to `[0, output_max]` and truncated
    pub quantized: Array3<u16>,
    pub diagnostics: FusionDiagnostics,
    /// Present when a reference stack was supplied
    pub report: Option<MetricReport>,
}
