//! Fusion quality assessment
//!
//! Every metric is a pure function of a candidate and a reference band stack
//! of identical shape. Band-wise metrics are computed per band and averaged;
//! SAM and ERGAS work across the band axis.

mod config;
mod report;
mod spatial;
mod spectral;
mod ssim;
mod suite;

pub use config::{MetricsConfig, MetricsConfigBuilder};
pub use report::MetricReport;
pub use spatial::{band_correlation, band_psnr, correlation_coefficient, mae, psnr, rmse};
pub use spectral::{ergas, sam, sam_visualization, SamResult};
pub use ssim::{band_ssim, ssim};
pub use suite::{normalize_bands, QualityMetrics};

use ndarray::ArrayView2;
use rayon::prelude::*;

use crate::pansharpen::bands::BandStack;
use crate::pansharpen::common::error::Result;

/// Applies `metric` to each band pair in parallel and averages the results.
fn band_average<F>(candidate: &BandStack, reference: &BandStack, context: &'static str, metric: F) -> Result<f64>
where
    F: Fn(ArrayView2<'_, f64>, ArrayView2<'_, f64>) -> f64 + Sync,
{
    candidate.ensure_same_shape(reference, context)?;
    let values: Vec<f64> = (0..candidate.band_count())
        .into_par_iter()
        .map(|b| metric(candidate.band(b), reference.band(b)))
        .collect();
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}
