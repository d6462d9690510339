//! Pansharpening engine
//!
//! Fuses an upsampled multispectral band stack with a panchromatic image
//! (closed-form Gram-Schmidt or iterative MAP estimation) and scores fused
//! output against a reference with a suite of quality metrics. The raster
//! and pipeline modules are thin adapters around the pure core.

pub mod common;
pub mod bands;
pub mod filters;
pub mod gram_schmidt;
pub mod map;
pub mod metrics;
pub mod raster;
pub mod pipeline;

pub use common::{
    PansharpenError,
    Result,
};

pub use bands::{
    BandStack,
    PanImage,
    WeightVector,
    synthesize,
    estimate_weights,
};

pub use gram_schmidt::{
    GramSchmidtConfig,
    GramSchmidtConfigBuilder,
    GramSchmidtFusion,
    GramSchmidtOutcome,
};

pub use map::{
    MapConfig,
    MapConfigBuilder,
    MapEnergyModel,
    MapOptimizer,
    MapOutcome,
};

pub use metrics::{
    MetricReport,
    MetricsConfig,
    MetricsConfigBuilder,
    QualityMetrics,
    SamResult,
};

pub use raster::{
    RasterReader,
    RasterWriter,
    TiffCompression,
    TiffRasterReader,
    TiffRasterWriter,
};

pub use pipeline::{
    FusionDiagnostics,
    FusionMethod,
    PansharpenPipeline,
    PipelineConfig,
    PipelineConfigBuilder,
    PipelineOutput,
};
