//! Raster ingress and egress
//!
//! TIFF adapters that turn single-band files into `f64` rasters and write
//! quantized band stacks and SAM maps back out. The fusion core never
//! touches these; the pipeline wires them around it.

mod reader;
mod tiff_reader;
mod writer;
mod tiff_writer;
pub mod types;

pub use reader::RasterReader;
pub use tiff_reader::TiffRasterReader;
pub use writer::RasterWriter;
pub use tiff_writer::TiffRasterWriter;
pub use types::TiffCompression;
