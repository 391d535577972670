//! Per-image metadata derived from a raster or a decode result.

use serde::Serialize;

use crate::pixel::{CanonicalBuffer, CanonicalLayout};
use crate::raster::Raster;

/// Bits per channel of every canonical buffer.
pub const CANONICAL_COLOR_DEPTH: u8 = 8;

/// Format-independent description of one image.
///
/// Values are derived, never edited: build one with
/// [`ImageMetadata::from_raster`] or [`ImageMetadata::from_decoded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ImageMetadata {
    width: u32,
    height: u32,
    has_alpha: bool,
    color_depth: u8,
}

impl ImageMetadata {
    /// Describe the image a raster will encode to.
    ///
    /// Color depth is reported after canonicalization, so indexed and
    /// low-depth gray sources also report 8 bits per channel.
    pub fn from_raster(raster: &Raster<'_>) -> Self {
        Self::from_decoded(raster.width(), raster.height(), raster.has_alpha())
    }

    /// Describe a decoded image.
    pub fn from_decoded(width: u32, height: u32, has_alpha: bool) -> Self {
        Self {
            width,
            height,
            has_alpha,
            color_depth: CANONICAL_COLOR_DEPTH,
        }
    }

    pub(crate) fn from_buffer(buffer: &CanonicalBuffer) -> Self {
        Self::from_decoded(buffer.width(), buffer.height(), buffer.has_alpha())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Bits per channel (always 8).
    pub fn color_depth(&self) -> u8 {
        self.color_depth
    }

    /// Canonical layout of the pixels this metadata describes.
    pub fn canonical_layout(&self) -> CanonicalLayout {
        CanonicalLayout::for_alpha(self.has_alpha)
    }

    /// Number of channels (3 for RGB, 4 for RGBA).
    pub fn channels(&self) -> usize {
        self.canonical_layout().channels()
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}
