use ndarray::{Array2, Array3, ArrayView2, Axis};
use tracing::{debug, info, instrument};

use crate::pansharpen::bands::BandStack;
use crate::pansharpen::common::error::Result;
use crate::pansharpen::common::stats::{floor_epsilon, min_max};
use crate::pansharpen::metrics::config::MetricsConfig;
use crate::pansharpen::metrics::report::MetricReport;
use crate::pansharpen::metrics::{spatial, spectral, ssim};

pub(crate) fn normalize_band(band: ArrayView2<'_, f64>) -> Array2<f64> {
    let (lo, hi) = min_max(band);
    let range = floor_epsilon(hi - lo, "band range");
    band.mapv(|v| (v - lo) / range)
}

/// Min-max normalises every band independently to `[0, 1]`.
pub fn normalize_bands(stack: &BandStack) -> BandStack {
    let mut data = Array3::zeros(stack.dim());
    for (mut slot, band) in data.axis_iter_mut(Axis(0)).zip(stack.bands()) {
        slot.assign(&normalize_band(band));
    }
    BandStack::from_array_unchecked(data)
}

/// Runs the full metric battery for one candidate/reference pair.
pub struct QualityMetrics {
    config: MetricsConfig,
}

impl QualityMetrics {
    pub fn new(config: MetricsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// CC, PSNR, MAE and RMSE use normalised bands when `normalize` is set
    /// (PSNR peak 1.0); SSIM always normalises; SAM and ERGAS use raw values.
    #[instrument(skip_all, fields(bands = candidate.band_count(), height = candidate.height(), width = candidate.width()))]
    pub fn evaluate(&self, candidate: &BandStack, reference: &BandStack) -> Result<MetricReport> {
        candidate.ensure_same_shape(reference, "quality metrics")?;

        let (cand, refr, peak) = if self.config.normalize {
            debug!("Normalizing bands for comparison");
            (normalize_bands(candidate), normalize_bands(reference), Some(1.0))
        } else {
            (candidate.clone(), reference.clone(), self.config.data_range)
        };

        let cc = spatial::correlation_coefficient(&cand, &refr)?;
        let psnr = spatial::psnr(&cand, &refr, peak)?;
        let ssim = ssim::ssim(candidate, reference)?;
        let mae = spatial::mae(&cand, &refr)?;
        let rmse = spatial::rmse(&cand, &refr)?;

        let sam = spectral::sam(candidate, reference)?;
        let ergas = spectral::ergas(candidate, reference, self.config.ratio)?;
        let sam_map = self.config.sam_map.then(|| sam.visualization());

        let report = MetricReport::new(cc, psnr, ssim, mae, rmse, sam.radians, ergas, sam_map);
        info!(cc, psnr, ssim, mae, rmse, sam_degrees = sam.degrees, ergas, "Evaluation complete");
        Ok(report)
    }
}
