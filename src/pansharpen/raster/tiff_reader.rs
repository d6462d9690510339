//! Single-band raster reader backed by the tiff crate.
//!
//! Accepts grayscale TIFFs with 8, 16 or 32-bit unsigned or 32/64-bit float
//! samples, the layouts satellite band products ship in.

use std::io::Cursor;

use ndarray::Array2;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::ColorType;
use tracing::debug;

use crate::pansharpen::common::error::{PansharpenError, Result};
use crate::pansharpen::raster::reader::RasterReader;

pub struct TiffRasterReader;

fn decode_error(e: tiff::TiffError) -> PansharpenError {
    PansharpenError::DecodeError(e.to_string())
}

fn decode_page<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Result<Array2<f64>> {
    let (width, height) = decoder.dimensions().map_err(decode_error)?;
    match decoder.colortype().map_err(decode_error)? {
        ColorType::Gray(_) => {}
        other => {
            return Err(PansharpenError::UnsupportedFormat(format!(
                "expected a single-band image, found {other:?}"
            )))
        }
    }

    let pixels: Vec<f64> = match decoder.read_image().map_err(decode_error)? {
        DecodingResult::U8(values) => values.into_iter().map(f64::from).collect(),
        DecodingResult::U16(values) => values.into_iter().map(f64::from).collect(),
        DecodingResult::U32(values) => values.into_iter().map(f64::from).collect(),
        DecodingResult::F32(values) => values.into_iter().map(f64::from).collect(),
        DecodingResult::F64(values) => values,
        _ => {
            return Err(PansharpenError::UnsupportedFormat(
                "sample format is not u8, u16, u32, f32 or f64".to_string(),
            ))
        }
    };

    debug!("Decoded band: {}x{}", width, height);
    Array2::from_shape_vec((height as usize, width as usize), pixels)
        .map_err(|e| PansharpenError::DecodeError(e.to_string()))
}

impl RasterReader for TiffRasterReader {
    fn read_band(&self, data: &[u8]) -> Result<Array2<f64>> {
        debug!("Decoding TIFF band, {} bytes", data.len());
        let mut decoder = Decoder::new(Cursor::new(data)).map_err(decode_error)?;
        decode_page(&mut decoder)
    }

    fn read_stack(&self, data: &[u8]) -> Result<Vec<Array2<f64>>> {
        let mut decoder = Decoder::new(Cursor::new(data)).map_err(decode_error)?;
        let mut bands = vec![decode_page(&mut decoder)?];
        while decoder.more_images() {
            decoder.next_image().map_err(decode_error)?;
            bands.push(decode_page(&mut decoder)?);
        }
        debug!("Decoded {} pages", bands.len());
        Ok(bands)
    }
}
