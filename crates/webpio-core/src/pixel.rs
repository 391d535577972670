//! Conversion between rasters and the canonical buffer libwebp consumes.
//!
//! The canonical buffer is row-major, 8-bit interleaved RGB or RGBA with no
//! row padding. Every color model has its own canonicalization routine:
//!
//! - direct layouts are reordered into R, G, B(, A)
//! - grayscale samples are scaled to 8 bits and replicated into R = G = B
//! - indexed pixels are resolved through the palette
//!
//! Decoding goes the other way through [`unpack`], which always yields a
//! direct-color raster.

use crate::error::{Error, Result};
use crate::raster::{ColorModel, DirectLayout, Palette, Raster};

/// Channel layout of a canonical buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalLayout {
    /// 3 bytes per pixel: R, G, B.
    Rgb,
    /// 4 bytes per pixel: R, G, B, A.
    Rgba,
}

impl CanonicalLayout {
    /// Pick RGBA when alpha must be carried, RGB otherwise.
    pub fn for_alpha(has_alpha: bool) -> Self {
        if has_alpha {
            Self::Rgba
        } else {
            Self::Rgb
        }
    }

    /// Number of channels (3 or 4).
    pub fn channels(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        self == Self::Rgba
    }

    fn direct_layout(self) -> DirectLayout {
        match self {
            Self::Rgb => DirectLayout::Rgb,
            Self::Rgba => DirectLayout::Rgba,
        }
    }
}

/// Packed pixels in the only shape the codec accepts or produces.
///
/// `len == height * width * channels` holds for every value of this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    layout: CanonicalLayout,
}

impl CanonicalBuffer {
    /// Wrap packed pixel data.
    ///
    /// # Errors
    ///
    /// Returns `Error::InternalInvariantViolation` if the dimensions are zero
    /// or `data` is not exactly `width * height * channels` bytes.
    pub fn new(data: Vec<u8>, width: u32, height: u32, layout: CanonicalLayout) -> Result<Self> {
        check_shape(data.len(), width, height, layout)?;
        Ok(Self {
            data,
            width,
            height,
            layout,
        })
    }

    /// Exact byte length of a canonical buffer with these dimensions.
    pub fn expected_len(width: u32, height: u32, layout: CanonicalLayout) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(layout.channels()))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> CanonicalLayout {
        self.layout
    }

    pub fn has_alpha(&self) -> bool {
        self.layout.has_alpha()
    }

    /// Bytes per row (`width * channels`).
    pub fn stride(&self) -> usize {
        self.width as usize * self.layout.channels()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Re-check the shape invariant right before a codec call.
    pub(crate) fn verify(&self) -> Result<()> {
        check_shape(self.data.len(), self.width, self.height, self.layout)
    }
}

fn check_shape(len: usize, width: u32, height: u32, layout: CanonicalLayout) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InternalInvariantViolation(format!(
            "canonical buffer has zero dimension: {width}x{height}"
        )));
    }
    match CanonicalBuffer::expected_len(width, height, layout) {
        Some(expected) if expected == len => Ok(()),
        Some(expected) => Err(Error::InternalInvariantViolation(format!(
            "canonical buffer for {width}x{height} {layout:?} must be {expected} bytes, got {len}"
        ))),
        None => Err(Error::InternalInvariantViolation(format!(
            "canonical buffer size overflows for {width}x{height}"
        ))),
    }
}

/// Pack a raster into a canonical buffer, carrying alpha only when the
/// raster has it.
pub fn pack(raster: &Raster<'_>) -> Result<CanonicalBuffer> {
    pack_as(raster, CanonicalLayout::for_alpha(raster.has_alpha()))
}

/// Pack a raster into a canonical buffer with an explicit layout.
///
/// Packing an opaque raster as [`CanonicalLayout::Rgba`] synthesizes
/// alpha = 255.
///
/// # Errors
///
/// Returns `Error::InvalidPixelData` if the raster has alpha and `layout`
/// is [`CanonicalLayout::Rgb`], or if an indexed pixel refers to an entry
/// past the end of the palette.
pub fn pack_as(raster: &Raster<'_>, layout: CanonicalLayout) -> Result<CanonicalBuffer> {
    if raster.has_alpha() && !layout.has_alpha() {
        return Err(Error::InvalidPixelData(
            "raster has alpha but the target layout is RGB; alpha would be discarded".to_string(),
        ));
    }

    let (width, height) = (raster.width(), raster.height());
    let len = CanonicalBuffer::expected_len(width, height, layout).ok_or_else(|| {
        Error::InvalidPixelData(format!("dimensions too large: {width}x{height}"))
    })?;
    let mut out = Vec::with_capacity(len);

    match raster.color_model() {
        ColorModel::Direct(direct) => pack_direct(raster, *direct, layout, &mut out),
        ColorModel::Gray { bits } => pack_gray(raster, *bits, layout, &mut out),
        ColorModel::Indexed { bits, palette } => {
            pack_indexed(raster, *bits, palette, layout, &mut out)?
        }
    }

    CanonicalBuffer::new(out, width, height, layout)
}

/// Turn a decoded canonical buffer back into a direct-color raster.
pub fn unpack(buffer: CanonicalBuffer) -> Raster<'static> {
    let (width, height) = (buffer.width, buffer.height);
    let layout = buffer.layout.direct_layout();
    Raster::from_canonical(buffer.data, width, height, layout)
}

/// [`unpack`] for loose parts: decoded bytes, dimensions and alpha flag.
///
/// # Errors
///
/// Returns `Error::InternalInvariantViolation` if `data` does not match the
/// dimensions.
pub fn unpack_parts(
    data: Vec<u8>,
    width: u32,
    height: u32,
    has_alpha: bool,
) -> Result<Raster<'static>> {
    let buffer = CanonicalBuffer::new(data, width, height, CanonicalLayout::for_alpha(has_alpha))?;
    Ok(unpack(buffer))
}

fn pack_direct(
    raster: &Raster<'_>,
    direct: DirectLayout,
    layout: CanonicalLayout,
    out: &mut Vec<u8>,
) {
    // Rows already in canonical order are copied as-is
    if direct == layout.direct_layout() {
        for y in 0..raster.height() {
            out.extend_from_slice(raster.row(y));
        }
        return;
    }

    let bpp = direct.bytes_per_pixel();
    let ([r, g, b], a) = direct.offsets();
    for y in 0..raster.height() {
        for px in raster.row(y).chunks_exact(bpp) {
            out.extend_from_slice(&[px[r], px[g], px[b]]);
            if layout.has_alpha() {
                out.push(a.map_or(u8::MAX, |a| px[a]));
            }
        }
    }
}

fn pack_gray(raster: &Raster<'_>, bits: u8, layout: CanonicalLayout, out: &mut Vec<u8>) {
    let scale = gray_scale(bits);
    let width = raster.width() as usize;
    for y in 0..raster.height() {
        for sample in samples(raster.row(y), bits, width) {
            let v = sample * scale;
            out.extend_from_slice(&[v, v, v]);
            if layout.has_alpha() {
                out.push(u8::MAX);
            }
        }
    }
}

fn pack_indexed(
    raster: &Raster<'_>,
    bits: u8,
    palette: &Palette,
    layout: CanonicalLayout,
    out: &mut Vec<u8>,
) -> Result<()> {
    let width = raster.width() as usize;
    for y in 0..raster.height() {
        for (x, index) in samples(raster.row(y), bits, width).enumerate() {
            let color = palette.get(usize::from(index)).ok_or_else(|| {
                Error::InvalidPixelData(format!(
                    "palette index {index} at ({x}, {y}) is out of range for a palette of {} entries",
                    palette.len()
                ))
            })?;
            out.extend_from_slice(&[color.r, color.g, color.b]);
            if layout.has_alpha() {
                out.push(color.a);
            }
        }
    }
    Ok(())
}

/// Multiplier that stretches an N-bit gray sample to the 0-255 range.
fn gray_scale(bits: u8) -> u8 {
    match bits {
        1 => 0xFF,
        2 => 0x55,
        4 => 0x11,
        _ => 0x01,
    }
}

/// Iterate the first `width` samples of a row packed MSB-first.
fn samples(row: &[u8], bits: u8, width: usize) -> impl Iterator<Item = u8> + '_ {
    let bits = usize::from(bits);
    let mask = ((1u16 << bits) - 1) as u8;
    (0..width).map(move |x| {
        let bit = x * bits;
        let shift = 8 - bits - bit % 8;
        (row[bit / 8] >> shift) & mask
    })
}


// ============================================================================
// Property-Based Tests
// ============================================================================
