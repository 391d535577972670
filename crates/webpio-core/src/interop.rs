//! Conversions between [`Raster`] and the `image` crate's `DynamicImage`.

use image::{DynamicImage, RgbImage, RgbaImage};

use crate::error::{Error, Result};
use crate::pixel::{pack, CanonicalLayout};
use crate::raster::Raster;

impl Raster<'static> {
    /// Copy a `DynamicImage` into an owned raster.
    ///
    /// 8-bit gray, RGB and RGBA images keep their layout. Every other
    /// variant is converted to 8-bit RGBA if it carries alpha, RGB otherwise.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPixelData` if the image has a zero dimension.
    pub fn from_dynamic_image(img: &DynamicImage) -> Result<Self> {
        let (width, height) = (img.width(), img.height());
        match img {
            DynamicImage::ImageLuma8(gray) => Raster::gray(gray.as_raw().clone(), width, height),
            DynamicImage::ImageRgb8(rgb) => Raster::rgb(rgb.as_raw().clone(), width, height),
            DynamicImage::ImageRgba8(rgba) => Raster::rgba(rgba.as_raw().clone(), width, height),
            other if other.color().has_alpha() => {
                Raster::rgba(other.to_rgba8().into_raw(), width, height)
            }
            other => Raster::rgb(other.to_rgb8().into_raw(), width, height),
        }
    }
}

impl Raster<'_> {
    /// Canonicalize into an `ImageRgb8` or `ImageRgba8`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPixelData` if the raster cannot be packed.
    pub fn to_dynamic_image(&self) -> Result<DynamicImage> {
        let packed = pack(self)?;
        let (width, height) = (packed.width(), packed.height());
        let mismatch = || {
            Error::InternalInvariantViolation(format!(
                "canonical buffer does not fit a {width}x{height} image"
            ))
        };
        match packed.layout() {
            CanonicalLayout::Rgb => RgbImage::from_raw(width, height, packed.into_vec())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(mismatch),
            CanonicalLayout::Rgba => RgbaImage::from_raw(width, height, packed.into_vec())
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(mismatch),
        }
    }
}
