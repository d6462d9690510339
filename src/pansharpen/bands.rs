//! Band stack data model and spectral synthesis
//!
//! Holds the in-memory raster types shared by both fusion methods and the
//! weighted band sum that turns a band stack into a synthetic panchromatic
//! image.

pub mod types;
mod synthesis;
mod regression;

pub use types::{BandStack, PanImage, WeightVector};
pub use synthesis::synthesize;
pub use regression::estimate_weights;

pub(crate) use synthesis::weighted_sum;
