//! Fusion pipeline
//!
//! Orchestrates decoding, optional cropping, fusion, quantization, quality
//! assessment and encoding. Readers and writers are pluggable so the
//! pipeline can run against in-memory sources.

mod types;
mod runner;


pub use types::{
    FusionDiagnostics,
    FusionMethod,
    PipelineConfig,
    PipelineConfigBuilder,
    PipelineOutput,
};
pub use runner::PansharpenPipeline;
