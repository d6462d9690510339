//! Raster output types

/// Compression applied to every page of a written raster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TiffCompression {
    /// Uncompressed strips
    #[default]
    None,
    Lzw,
    /// Deflate at its quickest level, usually enough for 16-bit reflectance
    DeflateFast,
    DeflateBalanced,
    /// Smallest files, slowest to write
    DeflateBest,
}

impl TiffCompression {
    pub(crate) fn to_tiff(self) -> tiff::encoder::Compression {
        use tiff::encoder::{compression::DeflateLevel, Compression};
        match self {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        }
    }
}
