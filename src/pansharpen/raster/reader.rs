use ndarray::Array2;

use crate::pansharpen::common::error::Result;

pub trait RasterReader {
    /// Decodes the first image of a file as a single band.
    fn read_band(&self, data: &[u8]) -> Result<Array2<f64>>;

    /// Decodes every image of a multi-page file, one band per page.
    fn read_stack(&self, data: &[u8]) -> Result<Vec<Array2<f64>>>;
}
