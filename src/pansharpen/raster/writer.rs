use std::io::Write;

use ndarray::{Array2, Array3};

use crate::pansharpen::common::error::Result;
use crate::pansharpen::raster::types::TiffCompression;

pub trait RasterWriter {
    /// Writes a quantized `(band, row, col)` stack, one page per band.
    fn write_stack(&self, stack: &Array3<u16>, output: &mut dyn Write, compression: TiffCompression) -> Result<()>;

    /// Writes an 8-bit single-band map such as the SAM visualization.
    fn write_map(&self, map: &Array2<u8>, output: &mut dyn Write, compression: TiffCompression) -> Result<()>;
}
