//! Bridge to the native WebP codec.
//!
//! The adapter talks to the codec only through [`WebPCodec`]. [`LibWebp`] is
//! the production implementation, backed by libwebp through the `webp`
//! crate. Compression internals are libwebp's business; this module owns the
//! calling contract:
//!
//! - buffers reaching the codec always satisfy
//!   `len == height * width * channels` (checked right before the call)
//! - every native error is surfaced as `EncodeFailure` or `DecodeFailure`
//!   with the libwebp cause attached
//! - an empty encode result counts as a failure

use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::metadata::ImageMetadata;
use crate::params::{CodecSettings, EncodeParameters};
use crate::pixel::{CanonicalBuffer, CanonicalLayout};

/// A complete compressed WebP image.
///
/// The adapter never looks inside; it only measures and forwards the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitstream(Vec<u8>);

impl Bitstream {
    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for Bitstream {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The encode/decode capability the adapter drives.
///
/// Implementations may block the calling thread for the whole call.
pub trait WebPCodec {
    /// Compress a canonical buffer.
    fn encode(&self, pixels: &CanonicalBuffer, params: &EncodeParameters) -> Result<Vec<u8>>;

    /// Decompress a complete bitstream into a canonical buffer.
    fn decode(&self, data: &[u8]) -> Result<CanonicalBuffer>;

    /// Read dimensions and alpha presence from the bitstream header.
    fn probe(&self, data: &[u8]) -> Result<ImageMetadata>;
}

impl<C: WebPCodec + ?Sized> WebPCodec for &C {
    fn encode(&self, pixels: &CanonicalBuffer, params: &EncodeParameters) -> Result<Vec<u8>> {
        (**self).encode(pixels, params)
    }

    fn decode(&self, data: &[u8]) -> Result<CanonicalBuffer> {
        (**self).decode(data)
    }

    fn probe(&self, data: &[u8]) -> Result<ImageMetadata> {
        (**self).probe(data)
    }
}

static LIBWEBP_READY: OnceLock<bool> = OnceLock::new();

/// One-time libwebp initialization.
///
/// Runs libwebp's config/ABI version check on first use and caches the
/// outcome. Safe to call from any number of threads; only one runs the check.
pub fn init() -> bool {
    *LIBWEBP_READY.get_or_init(|| webp::WebPConfig::new().is_ok())
}

/// libwebp-backed codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibWebp;

impl WebPCodec for LibWebp {
    fn encode(&self, pixels: &CanonicalBuffer, params: &EncodeParameters) -> Result<Vec<u8>> {
        if !init() {
            return Err(Error::EncodeFailure(
                "libwebp encoder ABI version mismatch".to_string(),
            ));
        }
        let mut config = webp::WebPConfig::new()
            .map_err(|_| Error::EncodeFailure("failed to initialize WebPConfig".to_string()))?;
        apply_settings(&mut config, &params.codec_settings());

        let (width, height) = (pixels.width(), pixels.height());
        let encoder = match pixels.layout() {
            CanonicalLayout::Rgb => webp::Encoder::from_rgb(pixels.as_bytes(), width, height),
            CanonicalLayout::Rgba => webp::Encoder::from_rgba(pixels.as_bytes(), width, height),
        };
        let memory = encoder
            .encode_advanced(&config)
            .map_err(|e| Error::EncodeFailure(format!("{e:?}")))?;

        Ok(memory.to_vec())
    }

    fn decode(&self, data: &[u8]) -> Result<CanonicalBuffer> {
        if !init() {
            return Err(Error::DecodeFailure(
                "libwebp decoder ABI version mismatch".to_string(),
            ));
        }
        let image = webp::Decoder::new(data).decode().ok_or_else(|| {
            Error::DecodeFailure("bitstream is truncated, malformed or uses unsupported features".to_string())
        })?;

        let layout = CanonicalLayout::for_alpha(image.is_alpha());
        CanonicalBuffer::new(image.to_vec(), image.width(), image.height(), layout)
    }

    fn probe(&self, data: &[u8]) -> Result<ImageMetadata> {
        let features = webp::BitstreamFeatures::new(data)
            .ok_or_else(|| Error::DecodeFailure("missing or invalid WebP header".to_string()))?;
        if features.has_animation() {
            return Err(Error::DecodeFailure(
                "animated WebP is not supported".to_string(),
            ));
        }
        Ok(ImageMetadata::from_decoded(
            features.width(),
            features.height(),
            features.has_alpha(),
        ))
    }
}

fn apply_settings(config: &mut webp::WebPConfig, settings: &CodecSettings) {
    config.lossless = i32::from(settings.lossless);
    config.quality = settings.quality;
    config.method = i32::from(settings.method);
    config.exact = i32::from(settings.exact);
}

/// Hand a packed buffer to the codec.
///
/// Takes the buffer by value: once packed, it belongs to the encode call.
pub(crate) fn encode_checked<C: WebPCodec + ?Sized>(
    codec: &C,
    pixels: CanonicalBuffer,
    params: &EncodeParameters,
) -> Result<Bitstream> {
    pixels.verify()?;
    let bytes = codec.encode(&pixels, params)?;
    if bytes.is_empty() {
        return Err(Error::EncodeFailure(
            "codec produced an empty bitstream".to_string(),
        ));
    }
    Ok(Bitstream(bytes))
}

/// Probe, check limits, then decode a complete bitstream.
pub(crate) fn decode_checked<C: WebPCodec + ?Sized>(
    codec: &C,
    data: &[u8],
    limits: &Limits,
) -> Result<CanonicalBuffer> {
    if data.is_empty() {
        return Err(Error::DecodeFailure("input is empty".to_string()));
    }
    let probed = codec.probe(data)?;
    limits.check(&probed)?;

    let pixels = codec.decode(data)?;
    pixels.verify()?;
    if (pixels.width(), pixels.height()) != (probed.width(), probed.height()) {
        return Err(Error::InternalInvariantViolation(format!(
            "decoded {}x{} pixels but the header declares {}x{}",
            pixels.width(),
            pixels.height(),
            probed.width(),
            probed.height()
        )));
    }
    Ok(pixels)
}
