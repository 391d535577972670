//! Resampling rasters before they are written.
//!
//! Resampling itself is delegated to `image::imageops::resize`; this module
//! canonicalizes the source raster, picks the target size and wraps the
//! result as a direct-color raster.

use image::{imageops, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pixel::{pack, unpack, unpack_parts, CanonicalLayout};
use crate::raster::Raster;

/// Largest width or height a WebP bitstream can hold.
pub const MAX_DIMENSION: u32 = 16383;

/// Interpolation filter for resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    #[default]
    Bilinear,
    /// Bicubic (Catmull-Rom) interpolation.
    CatmullRom,
    /// Lanczos3 interpolation (slower, highest quality).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> imageops::FilterType {
        match self {
            FilterType::Nearest => imageops::FilterType::Nearest,
            FilterType::Bilinear => imageops::FilterType::Triangle,
            FilterType::CatmullRom => imageops::FilterType::CatmullRom,
            FilterType::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// Scale a raster by independent horizontal and vertical factors.
///
/// # Arguments
///
/// * `raster` - The source raster, in any color model
/// * `x_scale` - Horizontal factor (0.5 halves the width)
/// * `y_scale` - Vertical factor
/// * `filter` - Interpolation filter to use
///
/// # Returns
///
/// A tightly packed RGB or RGBA raster of `round(width * x_scale)` by
/// `round(height * y_scale)` pixels, each at least 1.
///
/// # Errors
///
/// Returns `Error::InvalidPixelData` if a factor is not a positive finite
/// number, a target dimension exceeds [`MAX_DIMENSION`], or the raster
/// cannot be canonicalized.
pub fn scale(
    raster: &Raster<'_>,
    x_scale: f64,
    y_scale: f64,
    filter: FilterType,
) -> Result<Raster<'static>> {
    let width = scaled_dimension(raster.width(), x_scale)?;
    let height = scaled_dimension(raster.height(), y_scale)?;
    resize(raster, width, height, filter)
}

/// Resize a raster to exact dimensions.
///
/// # Errors
///
/// Returns `Error::InvalidPixelData` if either target dimension is zero or
/// above [`MAX_DIMENSION`], or the raster cannot be canonicalized.
pub fn resize(
    raster: &Raster<'_>,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<Raster<'static>> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidPixelData(format!(
            "resize target must be non-zero, got {width}x{height}"
        )));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(Error::InvalidPixelData(format!(
            "resize target {width}x{height} exceeds the WebP limit of {MAX_DIMENSION}"
        )));
    }

    let packed = pack(raster)?;

    // Fast path: if dimensions match, skip resampling
    if packed.width() == width && packed.height() == height {
        return Ok(unpack(packed));
    }

    let (src_width, src_height) = (packed.width(), packed.height());
    let filter = filter.to_image_filter();
    match packed.layout() {
        CanonicalLayout::Rgb => {
            let src = RgbImage::from_raw(src_width, src_height, packed.into_vec())
                .ok_or_else(|| buffer_mismatch(src_width, src_height))?;
            let resized = imageops::resize(&src, width, height, filter);
            unpack_parts(resized.into_raw(), width, height, false)
        }
        CanonicalLayout::Rgba => {
            let src = RgbaImage::from_raw(src_width, src_height, packed.into_vec())
                .ok_or_else(|| buffer_mismatch(src_width, src_height))?;
            let resized = imageops::resize(&src, width, height, filter);
            unpack_parts(resized.into_raw(), width, height, true)
        }
    }
}

fn scaled_dimension(dim: u32, factor: f64) -> Result<u32> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(Error::InvalidPixelData(format!(
            "scale factor must be positive and finite, got {factor}"
        )));
    }
    let target = (f64::from(dim) * factor).round();
    if target > f64::from(MAX_DIMENSION) {
        return Err(Error::InvalidPixelData(format!(
            "scaling {dim} by {factor} exceeds the WebP limit of {MAX_DIMENSION}"
        )));
    }
    Ok((target as u32).max(1))
}

fn buffer_mismatch(width: u32, height: u32) -> Error {
    Error::InternalInvariantViolation(format!(
        "canonical buffer does not fit a {width}x{height} image"
    ))
}
