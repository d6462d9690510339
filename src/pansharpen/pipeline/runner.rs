use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

use ndarray::Array2;
use tracing::{info, instrument};

use crate::pansharpen::{
    bands::{BandStack, PanImage},
    common::error::{PansharpenError, Result},
    gram_schmidt::GramSchmidtFusion,
    map::MapOptimizer,
    metrics::{MetricReport, QualityMetrics},
    pipeline::types::{FusionDiagnostics, FusionMethod, PipelineConfig, PipelineOutput},
    raster::{RasterReader, RasterWriter, TiffRasterReader, TiffRasterWriter},
};

pub struct PansharpenPipeline<R: RasterReader, W: RasterWriter> {
    reader: R,
    writer: W,
    config: PipelineConfig,
}

impl PansharpenPipeline<TiffRasterReader, TiffRasterWriter> {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::with_custom(TiffRasterReader, TiffRasterWriter, config)
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| PansharpenError::InputReadError(format!("{}: {}", path.display(), e)))
}

fn create_output(path: &Path) -> Result<std::fs::File> {
    std::fs::File::create(path)
        .map_err(|e| PansharpenError::OutputWriteError(format!("{}: {}", path.display(), e)))
}

impl<R: RasterReader, W: RasterWriter> PansharpenPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            reader,
            writer,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PipelineConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Runs the configured fusion method on already aligned inputs.
    pub fn fuse(&self, bands: &BandStack, pan: &PanImage) -> Result<(BandStack, FusionDiagnostics)> {
        match &self.config.method {
            FusionMethod::GramSchmidt(config) => {
                let outcome = GramSchmidtFusion::new(config.clone()).fuse(bands, pan)?;
                Ok((outcome.bands, FusionDiagnostics::GramSchmidt { gains: outcome.gains }))
            }
            FusionMethod::Map(config) => {
                let outcome = MapOptimizer::new(config.clone())?.optimize(bands, pan)?;
                Ok((
                    outcome.bands,
                    FusionDiagnostics::Map {
                        iterations: outcome.iterations,
                        gradient_norms: outcome.gradient_norms,
                        initial_energy: outcome.initial_energy,
                        final_energy: outcome.final_energy,
                    },
                ))
            }
        }
    }

    /// Crops, fuses and quantizes; scores the result when `reference` is given.
    ///
    /// The reference is cropped with the same window and compared against the
    /// unquantized fused bands.
    #[instrument(skip_all, fields(method = self.config.method.name(), bands = bands.band_count()))]
    pub fn run(&self, bands: &BandStack, pan: &PanImage, reference: Option<&BandStack>) -> Result<PipelineOutput> {
        let (bands, pan, reference) = match self.config.crop {
            Some((height, width)) => {
                let _span = tracing::info_span!("crop", height, width).entered();
                (
                    Cow::Owned(bands.center_crop(height, width)?),
                    Cow::Owned(pan.center_crop(height, width)?),
                    reference
                        .map(|r| r.center_crop(height, width).map(Cow::Owned))
                        .transpose()?,
                )
            }
            None => (Cow::Borrowed(bands), Cow::Borrowed(pan), reference.map(Cow::Borrowed)),
        };

        let (fused, diagnostics) = {
            let _span = tracing::info_span!("fuse").entered();
            self.fuse(&bands, &pan)?
        };

        let quantized = fused.to_u16(self.config.output_max);

        let report = match reference {
            Some(reference) => {
                let _span = tracing::info_span!("evaluate").entered();
                let metrics = QualityMetrics::new(self.config.metrics.clone())?;
                Some(metrics.evaluate(&fused, &reference)?)
            }
            None => None,
        };

        info!(
            bands = fused.band_count(),
            height = fused.height(),
            width = fused.width(),
            "Fusion complete"
        );
        Ok(PipelineOutput {
            fused,
            quantized,
            diagnostics,
            report,
        })
    }

    /// Decodes one single-band raster per entry into a stack.
    pub fn decode_bands(&self, band_data: &[&[u8]]) -> Result<BandStack> {
        let bands = band_data
            .iter()
            .map(|data| self.reader.read_band(data))
            .collect::<Result<Vec<_>>>()?;
        BandStack::from_bands(bands)
    }

    /// Decodes reference rasters, taking every page of each file in order.
    ///
    /// A single multi-page stack (such as a previous fused output) and one
    /// single-band file per band are both accepted.
    pub fn decode_reference(&self, reference_data: &[&[u8]]) -> Result<BandStack> {
        let mut bands = Vec::new();
        for data in reference_data {
            bands.extend(self.reader.read_stack(data)?);
        }
        BandStack::from_bands(bands)
    }

    #[instrument(skip_all, fields(bands = band_data.len(), pan_size = pan_data.len()))]
    pub fn process(
        &self,
        pan_data: &[u8],
        band_data: &[&[u8]],
        reference_data: Option<&[&[u8]]>,
        output: &mut dyn Write,
    ) -> Result<PipelineOutput> {
        info!("Starting fusion pipeline");

        let (bands, pan, reference) = {
            let _span = tracing::info_span!("decode_inputs").entered();
            let pan = PanImage::new(self.reader.read_band(pan_data)?)?;
            let bands = self.decode_bands(band_data)?;
            let reference = reference_data
                .map(|data| self.decode_reference(data))
                .transpose()?;
            (bands, pan, reference)
        };

        let result = self.run(&bands, &pan, reference.as_ref())?;

        {
            let _span = tracing::info_span!("encode_output").entered();
            self.writer
                .write_stack(&result.quantized, output, self.config.compression)?;
        }

        Ok(result)
    }

    #[instrument(skip_all)]
    pub fn process_files<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        pan_path: P,
        band_paths: &[P],
        reference_paths: Option<&[P]>,
        output_path: Q,
    ) -> Result<PipelineOutput> {
        let output_path = output_path.as_ref();
        info!(
            pan = %pan_path.as_ref().display(),
            bands = band_paths.len(),
            output = %output_path.display(),
            "Fusing files"
        );

        let (pan_data, band_data, reference_data) = {
            let _span = tracing::info_span!("read_input_files").entered();
            let pan_data = read_input(pan_path.as_ref())?;
            let band_data = band_paths
                .iter()
                .map(|p| read_input(p.as_ref()))
                .collect::<Result<Vec<_>>>()?;
            let reference_data = reference_paths
                .map(|paths| {
                    paths
                        .iter()
                        .map(|p| read_input(p.as_ref()))
                        .collect::<Result<Vec<_>>>()
                })
                .transpose()?;
            (pan_data, band_data, reference_data)
        };

        let band_slices: Vec<&[u8]> = band_data.iter().map(Vec::as_slice).collect();
        let reference_slices: Option<Vec<&[u8]>> = reference_data
            .as_ref()
            .map(|data| data.iter().map(Vec::as_slice).collect());

        let mut output_file = {
            let _span = tracing::info_span!("create_output_file").entered();
            create_output(output_path)?
        };

        self.process(&pan_data, &band_slices, reference_slices.as_deref(), &mut output_file)
    }

    /// Writes the report's SAM visualization, if it rendered one.
    ///
    /// Returns `false` when the report carries no map.
    pub fn write_sam_map<P: AsRef<Path>>(&self, report: &MetricReport, path: P) -> Result<bool> {
        let Some(map) = report.sam_map() else {
            return Ok(false);
        };
        self.write_map(map, path)?;
        Ok(true)
    }

    fn write_map<P: AsRef<Path>>(&self, map: &Array2<u8>, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut file = create_output(path)?;
        self.writer.write_map(map, &mut file, self.config.compression)?;
        info!(output = %path.display(), "SAM map written");
        Ok(())
    }
}
