use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use pansharp::logger;
use pansharp::pansharpen::{
    FusionDiagnostics, FusionMethod, GramSchmidtConfig, MapConfig, MetricsConfig, PansharpenPipeline,
    PipelineConfig, TiffCompression, WeightVector,
};

use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pansharp")]
#[command(about = "Fuse multispectral bands with a panchromatic image")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Closed-form Gram-Schmidt detail injection.
    GramSchmidt {
        #[command(flatten)]
        io: IoArgs,
    },
    /// Iterative MAP estimation by gradient descent.
    Map {
        #[command(flatten)]
        io: IoArgs,

        /// Smoothness prior strength.
        #[arg(long, default_value_t = 0.001)]
        alpha: f64,

        /// Data fidelity and pan consistency strength.
        #[arg(long, default_value_t = 1.0)]
        beta: f64,

        /// Gaussian sigma of the simulated sensor blur, in pixels.
        #[arg(long, default_value_t = 1.2)]
        blur_sigma: f64,

        /// Gradient descent step.
        #[arg(long, default_value_t = 0.05)]
        learning_rate: f64,

        /// Number of descent iterations.
        #[arg(long, default_value_t = 50)]
        max_iterations: usize,
    },
}

#[derive(Args)]
struct IoArgs {
    /// Panchromatic band (single-band TIFF).
    #[arg(long)]
    pan: PathBuf,

    /// Multispectral band upsampled to the pan grid; repeat per band.
    #[arg(long = "band", required = true)]
    bands: Vec<PathBuf>,

    /// Output multi-page 16-bit TIFF.
    #[arg(long)]
    out: PathBuf,

    /// Reference to score the result against: one multi-page stack, or one
    /// single-band file per band (repeat the flag).
    #[arg(long = "reference")]
    references: Vec<PathBuf>,

    /// Comma separated synthetic pan weights, one per band.
    #[arg(long, value_delimiter = ',', conflicts_with = "landsat8")]
    weights: Option<Vec<f64>>,

    /// Use the Landsat 8 OLI blue/green/red/NIR pan weights.
    #[arg(long)]
    landsat8: bool,

    /// Central window `HEIGHTxWIDTH` to process instead of the full scene.
    #[arg(long, value_parser = parse_window)]
    crop: Option<(usize, usize)>,

    /// Resolution ratio between multispectral and pan sources, for ERGAS.
    #[arg(long, default_value_t = 4.0)]
    ratio: f64,

    /// Write the 8-bit SAM map to this path (needs references).
    #[arg(long)]
    sam_map: Option<PathBuf>,

    /// Write the metric report to this path (needs references).
    #[arg(long)]
    report: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Compression::None)]
    compression: Compression,
}

#[derive(Clone, Copy, ValueEnum)]
enum Compression {
    None,
    Lzw,
    DeflateFast,
    DeflateBalanced,
    DeflateBest,
}

impl From<Compression> for TiffCompression {
    fn from(value: Compression) -> Self {
        match value {
            Compression::None => TiffCompression::None,
            Compression::Lzw => TiffCompression::Lzw,
            Compression::DeflateFast => TiffCompression::DeflateFast,
            Compression::DeflateBalanced => TiffCompression::DeflateBalanced,
            Compression::DeflateBest => TiffCompression::DeflateBest,
        }
    }
}

fn parse_window(value: &str) -> Result<(usize, usize), String> {
    let (height, width) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected HEIGHTxWIDTH, got {value}"))?;
    let parse = |s: &str| s.trim().parse::<usize>().map_err(|e| format!("{s}: {e}"));
    Ok((parse(height)?, parse(width)?))
}

impl IoArgs {
    fn weights(&self) -> Option<WeightVector> {
        if self.landsat8 {
            return Some(WeightVector::landsat8_oli());
        }
        self.weights.clone().map(WeightVector::new)
    }
}

fn main() -> anyhow::Result<()> {
    logger::init();

    let cli = Cli::parse();

    let (io, method) = match cli.command {
        Commands::GramSchmidt { io } => {
            let config = GramSchmidtConfig {
                weights: io.weights(),
            };
            (io, FusionMethod::GramSchmidt(config))
        }
        Commands::Map {
            io,
            alpha,
            beta,
            blur_sigma,
            learning_rate,
            max_iterations,
        } => {
            let config = MapConfig {
                weights: io.weights(),
                alpha,
                beta,
                blur_sigma,
                learning_rate,
                max_iterations,
            };
            (io, FusionMethod::Map(config))
        }
    };

    let config = PipelineConfig::builder()
        .method(method)
        .metrics(
            MetricsConfig::builder()
                .ratio(io.ratio)
                .sam_map(io.sam_map.is_some())
                .build(),
        )
        .compression(io.compression.into())
        .crop(io.crop)
        .build();
    let pipeline = PansharpenPipeline::new(config).context("invalid configuration")?;

    info!("Method: {}", pipeline.config().method.name());
    info!("Bands: {}", io.bands.len());

    let references = (!io.references.is_empty()).then_some(io.references.as_slice());
    if references.is_none() && (io.report.is_some() || io.sam_map.is_some()) {
        warn!("--report and --sam-map need --reference; skipping evaluation outputs");
    }

    let output = pipeline
        .process_files(io.pan.clone(), io.bands.as_slice(), references, &io.out)
        .with_context(|| format!("fusion into {} failed", io.out.display()))?;

    match &output.diagnostics {
        FusionDiagnostics::GramSchmidt { gains } => info!("Injection gains: {:?}", gains),
        FusionDiagnostics::Map {
            iterations,
            gradient_norms,
            initial_energy,
            final_energy,
        } => {
            info!(
                iterations = *iterations,
                "MAP energy {:.6e} -> {:.6e}",
                initial_energy,
                final_energy
            );
            if let (Some(first), Some(last)) = (gradient_norms.first(), gradient_norms.last()) {
                info!("Gradient norm {:.6e} -> {:.6e}", first, last);
            }
        }
    }

    if let Some(report) = &output.report {
        println!("{report}");

        if let Some(path) = &io.report {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            report.write_to(&mut file)?;
            info!("Report written to {}", path.display());
        }
        if let Some(path) = &io.sam_map {
            pipeline.write_sam_map(report, path)?;
        }
    }

    info!("Fused image written to {}", io.out.display());
    Ok(())
}
