use std::io::{Cursor, Write};

use ndarray::{Array2, Array3, Axis};
use tiff::encoder::{colortype, TiffEncoder};
use tracing::debug;

use crate::pansharpen::common::error::{PansharpenError, Result};
use crate::pansharpen::raster::types::TiffCompression;
use crate::pansharpen::raster::writer::RasterWriter;

pub struct TiffRasterWriter;

fn encode_error(e: tiff::TiffError) -> PansharpenError {
    PansharpenError::EncodeError(e.to_string())
}

impl RasterWriter for TiffRasterWriter {
    fn write_stack(&self, stack: &Array3<u16>, output: &mut dyn Write, compression: TiffCompression) -> Result<()> {
        let (bands, height, width) = stack.dim();
        debug!("Encoding {} band TIFF: {}x{}", bands, width, height);

        let mut buffer = Vec::new();
        let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
            .map_err(encode_error)?
            .with_compression(compression.to_tiff());

        for band in stack.axis_iter(Axis(0)) {
            let samples: Vec<u16> = band.iter().copied().collect();
            encoder
                .write_image::<colortype::Gray16>(width as u32, height as u32, &samples)
                .map_err(encode_error)?;
        }
        drop(encoder);

        output.write_all(&buffer)?;
        debug!("TIFF encoding complete");
        Ok(())
    }

    fn write_map(&self, map: &Array2<u8>, output: &mut dyn Write, compression: TiffCompression) -> Result<()> {
        let (height, width) = map.dim();
        let mut buffer = Vec::new();
        let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
            .map_err(encode_error)?
            .with_compression(compression.to_tiff());

        let samples: Vec<u8> = map.iter().copied().collect();
        encoder
            .write_image::<colortype::Gray8>(width as u32, height as u32, &samples)
            .map_err(encode_error)?;
        drop(encoder);

        output.write_all(&buffer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pansharpen::raster::{RasterReader, TiffRasterReader};

    #[test]
    fn test_stack_survives_tiff_encoding() {
        let stack = Array3::from_shape_fn((3, 4, 5), |(b, r, c)| (b * 1000 + r * 10 + c) as u16);
        let mut encoded = Vec::new();
        TiffRasterWriter
            .write_stack(&stack, &mut encoded, TiffCompression::DeflateFast)
            .unwrap();

        let bands = TiffRasterReader.read_stack(&encoded).unwrap();
        assert_eq!(bands.len(), 3);
        for (b, band) in bands.iter().enumerate() {
            assert_eq!(band.dim(), (4, 5));
            assert_eq!(band[[2, 3]], (b * 1000 + 23) as f64);
        }
        assert_eq!(TiffRasterReader.read_band(&encoded).unwrap(), bands[0]);
    }

    #[test]
    fn test_map_written_as_gray8() {
        let map = Array2::from_shape_fn((3, 3), |(r, c)| (r * 3 + c) as u8 * 20);
        let mut encoded = Vec::new();
        TiffRasterWriter.write_map(&map, &mut encoded, TiffCompression::None).unwrap();
        let band = TiffRasterReader.read_band(&encoded).unwrap();
        assert_eq!(band[[2, 2]], 160.0);
    }

    #[test]
    fn test_every_compression_decodes() {
        let stack = Array3::from_shape_fn((2, 8, 8), |(b, r, c)| ((b + 1) * (r * 8 + c) * 97 % 4096) as u16);
        for compression in [
            TiffCompression::None,
            TiffCompression::Lzw,
            TiffCompression::DeflateFast,
            TiffCompression::DeflateBalanced,
            TiffCompression::DeflateBest,
        ] {
            let mut encoded = Vec::new();
            TiffRasterWriter.write_stack(&stack, &mut encoded, compression).unwrap();
            let bands = TiffRasterReader.read_stack(&encoded).unwrap();
            assert_eq!(bands[1][[7, 7]], f64::from(stack[[1, 7, 7]]), "{compression:?}");
        }
    }

    #[test]
    fn test_garbage_input_is_a_decode_error() {
        let result = TiffRasterReader.read_band(b"not a tiff");
        assert!(matches!(result, Err(PansharpenError::DecodeError(_))));
    }
}
