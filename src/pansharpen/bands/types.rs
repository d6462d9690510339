//! Raster types for fusion inputs and outputs

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, s};

use crate::pansharpen::common::error::{PansharpenError, Result};

/// Ordered stack of equally shaped bands, laid out as `(band, row, col)`.
///
/// Values are `f64` during computation; integer pixels only appear at
/// ingress ([`BandStack::from_u16_bands`]) and egress ([`BandStack::to_u16`]).
#[derive(Debug, Clone, PartialEq)]
pub struct BandStack {
    data: Array3<f64>,
}

impl BandStack {
    pub fn new(data: Array3<f64>) -> Result<Self> {
        let (bands, height, width) = data.dim();
        if bands == 0 {
            return Err(PansharpenError::EmptyInput("band stack has no bands"));
        }
        if height == 0 || width == 0 {
            return Err(PansharpenError::EmptyInput("band stack has zero-sized bands"));
        }
        Ok(Self { data })
    }

    /// Stacks individual bands, failing if any band differs from the first.
    pub fn from_bands(bands: Vec<Array2<f64>>) -> Result<Self> {
        let first = bands
            .first()
            .ok_or(PansharpenError::EmptyInput("band stack has no bands"))?
            .dim();
        for band in &bands[1..] {
            if band.dim() != first {
                return Err(PansharpenError::shape_mismatch(
                    "band stack assembly",
                    &[first.0, first.1],
                    &[band.nrows(), band.ncols()],
                ));
            }
        }

        let mut data = Array3::zeros((bands.len(), first.0, first.1));
        for (mut slot, band) in data.axis_iter_mut(Axis(0)).zip(&bands) {
            slot.assign(band);
        }
        Self::new(data)
    }

    pub fn from_u16_bands(bands: &[Array2<u16>]) -> Result<Self> {
        Self::from_bands(bands.iter().map(|b| b.mapv(f64::from)).collect())
    }

    pub fn band_count(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn height(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn width(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// `(bands, height, width)`
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn spatial_dim(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn band(&self, index: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(0), index)
    }

    pub fn bands(&self) -> impl ExactSizeIterator<Item = ArrayView2<'_, f64>> {
        self.data.axis_iter(Axis(0))
    }

    pub fn view(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    pub fn as_array(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn into_array(self) -> Array3<f64> {
        self.data
    }

    /// Fails with `ShapeMismatch` unless `other` has identical band count and size.
    pub fn ensure_same_shape(&self, other: &BandStack, context: &'static str) -> Result<()> {
        if self.dim() != other.dim() {
            let (b, h, w) = self.dim();
            let (ob, oh, ow) = other.dim();
            return Err(PansharpenError::shape_mismatch(context, &[b, h, w], &[ob, oh, ow]));
        }
        Ok(())
    }

    /// Fails with `ShapeMismatch` unless the panchromatic image has the band size.
    pub fn ensure_matches_pan(&self, pan: &PanImage, context: &'static str) -> Result<()> {
        if self.spatial_dim() != pan.dim() {
            let (h, w) = self.spatial_dim();
            let (ph, pw) = pan.dim();
            return Err(PansharpenError::shape_mismatch(context, &[h, w], &[ph, pw]));
        }
        Ok(())
    }

    /// Final quantization: clip to `[0, max]` and truncate to integers.
    pub fn to_u16(&self, max: u16) -> Array3<u16> {
        let max = f64::from(max);
        self.data.mapv(|v| v.clamp(0.0, max) as u16)
    }

    /// Central window of `height x width` pixels across every band.
    pub fn center_crop(&self, height: usize, width: usize) -> Result<Self> {
        let (top, left) = crop_origin(self.spatial_dim(), (height, width))?;
        Self::new(
            self.data
                .slice(s![.., top..top + height, left..left + width])
                .to_owned(),
        )
    }

    pub(crate) fn from_array_unchecked(data: Array3<f64>) -> Self {
        Self { data }
    }
}

/// Single high-resolution panchromatic raster.
#[derive(Debug, Clone, PartialEq)]
pub struct PanImage {
    data: Array2<f64>,
}

impl PanImage {
    pub fn new(data: Array2<f64>) -> Result<Self> {
        if data.is_empty() {
            return Err(PansharpenError::EmptyInput("panchromatic image is empty"));
        }
        Ok(Self { data })
    }

    pub fn from_u16(data: &Array2<u16>) -> Result<Self> {
        Self::new(data.mapv(f64::from))
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn into_array(self) -> Array2<f64> {
        self.data
    }

    pub fn to_u16(&self, max: u16) -> Array2<u16> {
        let max = f64::from(max);
        self.data.mapv(|v| v.clamp(0.0, max) as u16)
    }

    pub fn center_crop(&self, height: usize, width: usize) -> Result<Self> {
        let (top, left) = crop_origin(self.dim(), (height, width))?;
        Self::new(
            self.data
                .slice(s![top..top + height, left..left + width])
                .to_owned(),
        )
    }

    pub(crate) fn from_array_unchecked(data: Array2<f64>) -> Self {
        Self { data }
    }
}

fn crop_origin(full: (usize, usize), window: (usize, usize)) -> Result<(usize, usize)> {
    if window.0 == 0 || window.1 == 0 || window.0 > full.0 || window.1 > full.1 {
        return Err(PansharpenError::InvalidParameter(format!(
            "crop window {}x{} does not fit a {}x{} raster",
            window.0, window.1, full.0, full.1
        )));
    }
    Ok((full.0 / 2 - window.0 / 2, full.1 / 2 - window.1 / 2))
}

/// Per-band contribution to the panchromatic signal. Need not sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector(Vec<f64>);

impl WeightVector {
    pub fn new(weights: Vec<f64>) -> Self {
        Self(weights)
    }

    /// `1/n` for each of `n` bands.
    pub fn uniform(bands: usize) -> Self {
        Self(vec![1.0 / bands as f64; bands])
    }

    /// Landsat 8 OLI response for the blue, green, red and NIR bands (B2-B5).
    pub fn landsat8_oli() -> Self {
        Self(vec![0.0842, 0.5375, 0.3784, 0.0])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.0.iter()
    }

    pub fn ensure_matches(&self, band_count: usize) -> Result<()> {
        if self.0.len() != band_count {
            return Err(PansharpenError::shape_mismatch(
                "weight vector",
                &[band_count],
                &[self.0.len()],
            ));
        }
        Ok(())
    }
}

impl From<Vec<f64>> for WeightVector {
    fn from(weights: Vec<f64>) -> Self {
        Self(weights)
    }
}
