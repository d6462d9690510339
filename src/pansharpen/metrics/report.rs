use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

use ndarray::Array2;

use crate::pansharpen::common::error::Result;

/// Fusion quality scores, produced once per evaluation and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricReport {
    cc: f64,
    psnr: f64,
    ssim: f64,
    mae: f64,
    rmse: f64,
    sam_radians: f64,
    sam_degrees: f64,
    ergas: f64,
    sam_map: Option<Array2<u8>>,
}

impl MetricReport {
    pub const CC: &'static str = "CC";
    pub const PSNR: &'static str = "PSNR";
    pub const SSIM: &'static str = "SSIM";
    pub const MAE: &'static str = "MAE";
    pub const RMSE: &'static str = "RMSE";
    pub const SAM_RADIANS: &'static str = "SAM (radians)";
    pub const SAM_DEGREES: &'static str = "SAM (degrees)";
    pub const ERGAS: &'static str = "ERGAS";

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        cc: f64,
        psnr: f64,
        ssim: f64,
        mae: f64,
        rmse: f64,
        sam_radians: f64,
        ergas: f64,
        sam_map: Option<Array2<u8>>,
    ) -> Self {
        Self {
            cc,
            psnr,
            ssim,
            mae,
            rmse,
            sam_radians,
            sam_degrees: sam_radians.to_degrees(),
            ergas,
            sam_map,
        }
    }

    pub fn cc(&self) -> f64 {
        self.cc
    }

    pub fn psnr(&self) -> f64 {
        self.psnr
    }

    pub fn ssim(&self) -> f64 {
        self.ssim
    }

    pub fn mae(&self) -> f64 {
        self.mae
    }

    pub fn rmse(&self) -> f64 {
        self.rmse
    }

    pub fn sam_radians(&self) -> f64 {
        self.sam_radians
    }

    pub fn sam_degrees(&self) -> f64 {
        self.sam_degrees
    }

    pub fn ergas(&self) -> f64 {
        self.ergas
    }

    /// 8-bit log-scaled SAM map, present when requested in the config.
    pub fn sam_map(&self) -> Option<&Array2<u8>> {
        self.sam_map.as_ref()
    }

    /// Metric name to value, in reporting order.
    pub fn entries(&self) -> [(&'static str, f64); 8] {
        [
            (Self::CC, self.cc),
            (Self::PSNR, self.psnr),
            (Self::SSIM, self.ssim),
            (Self::MAE, self.mae),
            (Self::RMSE, self.rmse),
            (Self::SAM_RADIANS, self.sam_radians),
            (Self::SAM_DEGREES, self.sam_degrees),
            (Self::ERGAS, self.ergas),
        ]
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries()
            .into_iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        self.entries().into_iter().collect()
    }

    /// Writes the human-readable report, e.g. to a results file.
    pub fn write_to(&self, output: &mut dyn Write) -> Result<()> {
        write!(output, "{self}")?;
        Ok(())
    }
}

impl fmt::Display for MetricReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pansharpening Evaluation Metrics:")?;
        writeln!(f, "---------------------------------")?;
        writeln!(f, "--- Spatial Metrics ---")?;
        writeln!(f, "Correlation Coefficient (CC): {:.4} (higher is better)", self.cc)?;
        writeln!(f, "Peak Signal-to-Noise Ratio (PSNR): {:.4} dB (higher is better)", self.psnr)?;
        writeln!(f, "Structural Similarity Index (SSIM): {:.4} (higher is better)", self.ssim)?;
        writeln!(f, "Mean Absolute Error (MAE): {:.4} (lower is better)", self.mae)?;
        writeln!(f, "Root Mean Square Error (RMSE): {:.4} (lower is better)", self.rmse)?;
        writeln!(f, "--- Spectral Metrics ---")?;
        writeln!(f, "Spectral Angle Mapper (SAM): {:.4} radians, {:.4} degrees (lower is better)", self.sam_radians, self.sam_degrees)?;
        writeln!(f, "ERGAS: {:.4} (lower is better)", self.ergas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> MetricReport {
        MetricReport::new(0.9, 35.0, 0.8, 0.02, 0.03, std::f64::consts::PI / 180.0, 2.5, None)
    }

    #[test]
    fn test_lookup_by_name() {
        let report = report();
        assert_eq!(report.get("CC"), Some(0.9));
        assert_eq!(report.get(MetricReport::ERGAS), Some(2.5));
        assert!((report.get("SAM (degrees)").unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(report.get("Q4"), None);
        assert_eq!(report.to_map().len(), 8);
    }

    #[test]
    fn test_write_to() {
        let mut buffer = Vec::new();
        report().write_to(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("Peak Signal-to-Noise Ratio (PSNR): 35.0000 dB"));
        assert!(text.contains("ERGAS: 2.5000"));
    }
}
