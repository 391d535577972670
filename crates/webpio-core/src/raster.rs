//! Raster data model: the pipeline-side view of an image.
//!
//! A [`Raster`] pairs a pixel buffer with its dimensions, row stride and a
//! [`ColorModel`] tag. Rasters handed to the writer usually borrow the
//! caller's storage; rasters produced by the reader own their pixels.
//!
//! # Sample Packing
//!
//! - Direct layouts store one byte per channel, interleaved.
//! - Gray and indexed rasters with fewer than 8 bits per sample pack samples
//!   MSB-first; every row starts on a byte boundary.

use std::borrow::Cow;

use rgb::{RGB8, RGBA8};

use crate::error::{Error, Result};

/// Channel order of an 8-bit direct-color raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectLayout {
    /// R, G, B.
    Rgb,
    /// B, G, R.
    Bgr,
    /// R, G, B, A.
    Rgba,
    /// B, G, R, A.
    Bgra,
    /// A, R, G, B.
    Argb,
    /// A, B, G, R.
    Abgr,
    /// B, G, R, padding. The fourth byte is ignored, pixels are opaque.
    Bgrx,
}

impl DirectLayout {
    /// Bytes per pixel for this layout.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb | Self::Bgr => 3,
            Self::Rgba | Self::Bgra | Self::Argb | Self::Abgr | Self::Bgrx => 4,
        }
    }

    /// Whether this layout carries an alpha channel.
    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba | Self::Bgra | Self::Argb | Self::Abgr)
    }

    /// Byte offsets of red, green, blue and (if present) alpha within a pixel.
    pub(crate) fn offsets(self) -> ([usize; 3], Option<usize>) {
        match self {
            Self::Rgb => ([0, 1, 2], None),
            Self::Bgr | Self::Bgrx => ([2, 1, 0], None),
            Self::Rgba => ([0, 1, 2], Some(3)),
            Self::Bgra => ([2, 1, 0], Some(3)),
            Self::Argb => ([1, 2, 3], Some(0)),
            Self::Abgr => ([3, 2, 1], Some(0)),
        }
    }
}

/// Color table for indexed rasters (1 to 256 entries).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<RGBA8>,
}

impl Palette {
    /// Largest palette an 8-bit index can address.
    pub const MAX_ENTRIES: usize = 256;

    /// Create a palette from RGBA entries.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPixelData` if the palette is empty or has more
    /// than [`Palette::MAX_ENTRIES`] entries.
    pub fn new(entries: Vec<RGBA8>) -> Result<Self> {
        if entries.is_empty() || entries.len() > Self::MAX_ENTRIES {
            return Err(Error::InvalidPixelData(format!(
                "palette must have 1 to {} entries, got {}",
                Self::MAX_ENTRIES,
                entries.len()
            )));
        }
        Ok(Self { entries })
    }

    /// Create an opaque palette from RGB entries.
    pub fn from_rgb(entries: &[RGB8]) -> Result<Self> {
        Self::new(
            entries
                .iter()
                .map(|c| RGBA8::new(c.r, c.g, c.b, u8::MAX))
                .collect(),
        )
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`; a palette holds at least one entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a palette entry.
    #[inline]
    pub fn get(&self, index: usize) -> Option<RGBA8> {
        self.entries.get(index).copied()
    }

    /// All entries in index order.
    pub fn entries(&self) -> &[RGBA8] {
        &self.entries
    }

    /// Whether any entry is not fully opaque.
    pub fn has_alpha(&self) -> bool {
        self.entries.iter().any(|c| c.a != u8::MAX)
    }
}

/// Color model tag of a raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorModel {
    /// 8-bit interleaved direct color.
    Direct(DirectLayout),
    /// Single-channel grayscale with 1, 2, 4 or 8 bits per sample.
    Gray { bits: u8 },
    /// 1, 2, 4 or 8-bit indices into a palette.
    Indexed { bits: u8, palette: Palette },
}

impl ColorModel {
    /// Bits occupied by one pixel in the source buffer.
    pub fn bits_per_pixel(&self) -> usize {
        match self {
            Self::Direct(layout) => layout.bytes_per_pixel() * 8,
            Self::Gray { bits } | Self::Indexed { bits, .. } => usize::from(*bits),
        }
    }

    /// Bits per sample as stored in the source buffer.
    pub fn sample_depth(&self) -> u8 {
        match self {
            Self::Direct(_) => 8,
            Self::Gray { bits } | Self::Indexed { bits, .. } => *bits,
        }
    }

    /// Whether pixels of this model can be non-opaque.
    pub fn has_alpha(&self) -> bool {
        match self {
            Self::Direct(layout) => layout.has_alpha(),
            Self::Gray { .. } => false,
            Self::Indexed { palette, .. } => palette.has_alpha(),
        }
    }

    /// Packed bytes needed for one row of `width` pixels.
    pub fn row_bytes(&self, width: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(self.bits_per_pixel())
            .and_then(|bits| bits.checked_add(7))
            .map(|bits| bits / 8)
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Direct(_) => Ok(()),
            Self::Gray { bits } | Self::Indexed { bits, .. } => {
                if matches!(bits, 1 | 2 | 4 | 8) {
                    Ok(())
                } else {
                    Err(Error::InvalidPixelData(format!(
                        "sample depth must be 1, 2, 4 or 8 bits, got {bits}"
                    )))
                }
            }
        }
    }
}

/// An image in one of the supported color models.
///
/// Constructors check the raster invariants: non-zero dimensions, a valid
/// sample depth, a stride that fits one packed row, and storage covering
/// every row.
#[derive(Debug, Clone)]
pub struct Raster<'a> {
    width: u32,
    height: u32,
    color_model: ColorModel,
    stride: usize,
    row_bytes: usize,
    pixels: Cow<'a, [u8]>,
}

impl<'a> Raster<'a> {
    /// Create a raster with tightly packed rows.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPixelData` if the dimensions are zero, the
    /// sample depth is unsupported, or `pixels` is too short.
    pub fn new(
        pixels: impl Into<Cow<'a, [u8]>>,
        width: u32,
        height: u32,
        color_model: ColorModel,
    ) -> Result<Self> {
        let stride = color_model
            .row_bytes(width)
            .ok_or_else(|| too_large(width, height))?;
        Self::with_stride(pixels, width, height, color_model, stride)
    }

    /// Create a raster whose rows start `stride` bytes apart.
    pub fn with_stride(
        pixels: impl Into<Cow<'a, [u8]>>,
        width: u32,
        height: u32,
        color_model: ColorModel,
        stride: usize,
    ) -> Result<Self> {
        let pixels = pixels.into();
        if width == 0 || height == 0 {
            return Err(Error::InvalidPixelData(format!(
                "dimensions must be non-zero, got {width}x{height}"
            )));
        }
        color_model.validate()?;

        let row_bytes = color_model
            .row_bytes(width)
            .ok_or_else(|| too_large(width, height))?;
        if stride < row_bytes {
            return Err(Error::InvalidPixelData(format!(
                "stride {stride} is smaller than a row of {row_bytes} bytes"
            )));
        }
        let needed = stride
            .checked_mul(height as usize - 1)
            .and_then(|n| n.checked_add(row_bytes))
            .ok_or_else(|| too_large(width, height))?;
        if pixels.len() < needed {
            return Err(Error::InvalidPixelData(format!(
                "expected at least {needed} bytes for {width}x{height}, got {}",
                pixels.len()
            )));
        }

        Ok(Self {
            width,
            height,
            color_model,
            stride,
            row_bytes,
            pixels,
        })
    }

    /// Tightly packed 8-bit RGB raster.
    pub fn rgb(pixels: impl Into<Cow<'a, [u8]>>, width: u32, height: u32) -> Result<Self> {
        Self::new(pixels, width, height, ColorModel::Direct(DirectLayout::Rgb))
    }

    /// Tightly packed 8-bit RGBA raster.
    pub fn rgba(pixels: impl Into<Cow<'a, [u8]>>, width: u32, height: u32) -> Result<Self> {
        Self::new(pixels, width, height, ColorModel::Direct(DirectLayout::Rgba))
    }

    /// Tightly packed 8-bit grayscale raster.
    pub fn gray(pixels: impl Into<Cow<'a, [u8]>>, width: u32, height: u32) -> Result<Self> {
        Self::new(pixels, width, height, ColorModel::Gray { bits: 8 })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn color_model(&self) -> &ColorModel {
        &self.color_model
    }

    /// Distance in bytes between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The underlying storage, including any row padding.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn has_alpha(&self) -> bool {
        self.color_model.has_alpha()
    }

    pub fn sample_depth(&self) -> u8 {
        self.color_model.sample_depth()
    }

    /// Whether the pixel storage is borrowed from the caller.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.pixels, Cow::Borrowed(_))
    }

    /// Take ownership of the pixel storage (copies if borrowed).
    pub fn into_owned(self) -> Raster<'static> {
        Raster {
            width: self.width,
            height: self.height,
            color_model: self.color_model,
            stride: self.stride,
            row_bytes: self.row_bytes,
            pixels: Cow::Owned(self.pixels.into_owned()),
        }
    }

    /// Packed bytes of row `y`, without padding.
    pub(crate) fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.pixels[start..start + self.row_bytes]
    }

    /// Zero-copy view of a rectangle of this raster.
    ///
    /// The view shares the parent's stride, so packing it only touches the
    /// selected pixels. Models with fewer than 8 bits per pixel cannot be
    /// split at arbitrary columns and are rejected.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPixelData` if the rectangle is empty, extends
    /// past the raster, or the color model is not byte-aligned.
    pub fn region(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Raster<'_>> {
        let bits = self.color_model.bits_per_pixel();
        if bits % 8 != 0 {
            return Err(Error::InvalidPixelData(format!(
                "regions require byte-aligned pixels, got {bits} bits per pixel"
            )));
        }
        let fits_x = x.checked_add(width).is_some_and(|r| r <= self.width);
        let fits_y = y.checked_add(height).is_some_and(|b| b <= self.height);
        if width == 0 || height == 0 || !fits_x || !fits_y {
            return Err(Error::InvalidPixelData(format!(
                "region {width}x{height} at ({x}, {y}) is outside the {}x{} raster",
                self.width, self.height
            )));
        }

        let offset = y as usize * self.stride + x as usize * (bits / 8);
        Raster::with_stride(
            &self.pixels[offset..],
            width,
            height,
            self.color_model.clone(),
            self.stride,
        )
    }

    /// Build a tightly packed direct raster from an already-validated buffer.
    pub(crate) fn from_canonical(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        layout: DirectLayout,
    ) -> Raster<'static> {
        let row_bytes = width as usize * layout.bytes_per_pixel();
        debug_assert_eq!(pixels.len(), row_bytes * height as usize);
        Raster {
            width,
            height,
            color_model: ColorModel::Direct(layout),
            stride: row_bytes,
            row_bytes,
            pixels: Cow::Owned(pixels),
        }
    }
}

fn too_large(width: u32, height: u32) -> Error {
    Error::InvalidPixelData(format!("dimensions too large: {width}x{height}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_palette() -> Palette {
        Palette::from_rgb(&[RGB8::new(0, 0, 0), RGB8::new(255, 255, 255)]).unwrap()
    }

    #[test]
    fn test_direct_layout_channels() {
        assert_eq!(DirectLayout::Rgb.bytes_per_pixel(), 3);
        assert_eq!(DirectLayout::Bgr.bytes_per_pixel(), 3);
        assert_eq!(DirectLayout::Argb.bytes_per_pixel(), 4);
        assert_eq!(DirectLayout::Bgrx.bytes_per_pixel(), 4);

        assert!(DirectLayout::Argb.has_alpha());
        assert!(DirectLayout::Abgr.has_alpha());
        assert!(!DirectLayout::Bgrx.has_alpha());
        assert!(!DirectLayout::Rgb.has_alpha());
    }

    #[test]
    fn test_palette_bounds() {
        assert!(matches!(
            Palette::new(vec![]),
            Err(Error::InvalidPixelData(_))
        ));
        assert!(matches!(
            Palette::new(vec![RGBA8::new(0, 0, 0, 255); 257]),
            Err(Error::InvalidPixelData(_))
        ));
        let full = Palette::new(vec![RGBA8::new(1, 2, 3, 255); 256]).unwrap();
        assert_eq!(full.len(), 256);
        assert!(!full.has_alpha());
    }

    #[test]
    fn test_palette_alpha_detection() {
        let palette = Palette::new(vec![
            RGBA8::new(10, 20, 30, 255),
            RGBA8::new(40, 50, 60, 0),
        ])
        .unwrap();
        assert!(palette.has_alpha());
        assert_eq!(palette.get(1), Some(RGBA8::new(40, 50, 60, 0)));
        assert_eq!(palette.get(2), None);
    }

    #[test]
    fn test_row_bytes_sub_byte() {
        let model = ColorModel::Gray { bits: 1 };
        assert_eq!(model.row_bytes(1), Some(1));
        assert_eq!(model.row_bytes(8), Some(1));
        assert_eq!(model.row_bytes(9), Some(2));

        let model = ColorModel::Indexed {
            bits: 4,
            palette: gray_palette(),
        };
        assert_eq!(model.row_bytes(3), Some(2));
    }

    #[test]
    fn test_raster_rejects_zero_dimensions() {
        assert!(matches!(
            Raster::rgb(vec![], 0, 4),
            Err(Error::InvalidPixelData(_))
        ));
        assert!(matches!(
            Raster::rgb(vec![], 4, 0),
            Err(Error::InvalidPixelData(_))
        ));
    }

    #[test]
    fn test_raster_rejects_short_buffer() {
        let pixels = vec![0u8; 4 * 4 * 3 - 1];
        assert!(matches!(
            Raster::rgb(pixels, 4, 4),
            Err(Error::InvalidPixelData(_))
        ));
    }

    #[test]
    fn test_raster_rejects_bad_depth() {
        let result = Raster::new(vec![0u8; 16], 4, 4, ColorModel::Gray { bits: 3 });
        assert!(matches!(result, Err(Error::InvalidPixelData(_))));

        let result = Raster::new(
            vec![0u8; 64],
            4,
            4,
            ColorModel::Indexed {
                bits: 16,
                palette: gray_palette(),
            },
        );
        assert!(matches!(result, Err(Error::InvalidPixelData(_))));
    }

    #[test]
    fn test_raster_rejects_small_stride() {
        let result = Raster::with_stride(
            vec![0u8; 64],
            4,
            4,
            ColorModel::Direct(DirectLayout::Rgb),
            11,
        );
        assert!(matches!(result, Err(Error::InvalidPixelData(_))));
    }

    #[test]
    fn test_last_row_needs_no_padding() {
        // 2 rows of 3 RGB pixels, stride 16: 16 + 9 bytes are enough
        let raster = Raster::with_stride(
            vec![0u8; 25],
            3,
            2,
            ColorModel::Direct(DirectLayout::Rgb),
            16,
        )
        .unwrap();
        assert_eq!(raster.row(1).len(), 9);
    }

    #[test]
    fn test_borrowed_and_owned() {
        let pixels = vec![7u8; 2 * 2 * 3];
        let raster = Raster::rgb(&pixels[..], 2, 2).unwrap();
        assert!(raster.is_borrowed());

        let owned = raster.into_owned();
        assert!(!owned.is_borrowed());
        assert_eq!(owned.pixels(), &pixels[..]);
    }

    #[test]
    fn test_region_view() {
        // 4x3 gray image with value = y * 10 + x
        let pixels: Vec<u8> = (0..3)
            .flat_map(|y| (0..4).map(move |x| (y * 10 + x) as u8))
            .collect();
        let raster = Raster::gray(&pixels[..], 4, 3).unwrap();

        let region = raster.region(1, 1, 2, 2).unwrap();
        assert_eq!(region.width(), 2);
        assert_eq!(region.height(), 2);
        assert_eq!(region.stride(), 4);
        assert!(region.is_borrowed());
        assert_eq!(region.row(0), &[11, 12]);
        assert_eq!(region.row(1), &[21, 22]);
    }

    #[test]
    fn test_region_out_of_bounds() {
        let raster = Raster::rgb(vec![0u8; 4 * 4 * 3], 4, 4).unwrap();
        assert!(raster.region(3, 0, 2, 1).is_err());
        assert!(raster.region(0, 4, 1, 1).is_err());
        assert!(raster.region(0, 0, 0, 1).is_err());
        assert!(raster.region(u32::MAX, 0, 2, 1).is_err());
    }

    #[test]
    fn test_region_rejects_sub_byte_models() {
        let raster = Raster::new(vec![0u8; 4], 8, 4, ColorModel::Gray { bits: 1 }).unwrap();
        assert!(matches!(
            raster.region(0, 0, 4, 4),
            Err(Error::InvalidPixelData(_))
        ));
    }

    #[test]
    fn test_sample_depth_and_alpha() {
        let indexed = Raster::new(
            vec![0u8; 4],
            4,
            4,
            ColorModel::Indexed {
                bits: 2,
                palette: gray_palette(),
            },
        )
        .unwrap();
        assert_eq!(indexed.sample_depth(), 2);
        assert!(!indexed.has_alpha());

        let argb = Raster::new(
            vec![0u8; 16],
            2,
            2,
            ColorModel::Direct(DirectLayout::Argb),
        )
        .unwrap();
        assert_eq!(argb.sample_depth(), 8);
        assert!(argb.has_alpha());
    }
}
