//! Whole-image WebP read/write entry points.
//!
//! Both directions are all-or-nothing. Encoding validates parameters, packs
//! the raster, and runs the codec before the sink is touched; the sink then
//! receives the complete bitstream in a single `write_all` followed by
//! `flush`. Decoding needs the complete bitstream in memory and returns one
//! fully populated [`DecodedImage`] or an error.

use std::io::{Read, Write};

use crate::codec::{decode_checked, encode_checked, Bitstream, LibWebp, WebPCodec};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::metadata::ImageMetadata;
use crate::params::WriteParam;
use crate::pixel::{pack, unpack};
use crate::raster::Raster;

/// Result of a successful encode.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bitstream: Bitstream,
    /// Metadata of the source raster after canonicalization.
    pub metadata: ImageMetadata,
}

/// Result of a successful decode.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Tightly packed RGB or RGBA raster.
    pub raster: Raster<'static>,
    pub metadata: ImageMetadata,
}

/// Encodes rasters to WebP.
#[derive(Debug, Clone, Default)]
pub struct WebPWriter<C = LibWebp> {
    codec: C,
}

impl WebPWriter {
    /// Writer backed by libwebp.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: WebPCodec> WebPWriter<C> {
    /// Writer backed by an arbitrary codec.
    pub fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    /// Encode a raster into an in-memory bitstream.
    ///
    /// # Arguments
    ///
    /// * `raster` - Source image in any supported color model
    /// * `param` - Compression settings; unset fields take their defaults
    ///
    /// # Errors
    ///
    /// - `UnsupportedCompressionType` / `InvalidQuality` for bad parameters,
    ///   raised before any pixel is read
    /// - `InvalidPixelData` if the raster cannot be canonicalized
    /// - `EncodeFailure` if the codec rejects the image
    pub fn encode(&self, raster: &Raster<'_>, param: &WriteParam) -> Result<EncodedImage> {
        let params = param.validate()?;
        let packed = pack(raster)?;
        let metadata = ImageMetadata::from_buffer(&packed);
        let bitstream = encode_checked(&self.codec, packed, &params)?;
        Ok(EncodedImage {
            bitstream,
            metadata,
        })
    }

    /// Encode a raster and write the bitstream to `sink`.
    ///
    /// Returns the number of bytes written. On any encode error nothing is
    /// written.
    pub fn write<W: Write + ?Sized>(
        &self,
        raster: &Raster<'_>,
        param: &WriteParam,
        sink: &mut W,
    ) -> Result<usize> {
        let encoded = self.encode(raster, param)?;
        sink.write_all(encoded.bitstream.as_bytes())?;
        sink.flush()?;
        Ok(encoded.bitstream.len())
    }
}

/// Decodes WebP bitstreams to rasters.
#[derive(Debug, Clone, Default)]
pub struct WebPReader<C = LibWebp> {
    codec: C,
    limits: Limits,
}

impl WebPReader {
    /// Reader backed by libwebp, without limits.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: WebPCodec> WebPReader<C> {
    /// Reader backed by an arbitrary codec.
    pub fn with_codec(codec: C) -> Self {
        Self {
            codec,
            limits: Limits::none(),
        }
    }

    /// Check every bitstream header against `limits` before decoding.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Decode a complete bitstream.
    ///
    /// # Errors
    ///
    /// - `DecodeFailure` for empty, truncated, malformed or unsupported input
    /// - `LimitExceeded` if the header declares an image over the limits
    pub fn decode(&self, data: &[u8]) -> Result<DecodedImage> {
        let buffer = decode_checked(&self.codec, data, &self.limits)?;
        let metadata = ImageMetadata::from_buffer(&buffer);
        Ok(DecodedImage {
            raster: unpack(buffer),
            metadata,
        })
    }

    /// Read `source` to its end, then decode.
    pub fn read<R: Read + ?Sized>(&self, source: &mut R) -> Result<DecodedImage> {
        let mut data = Vec::new();
        source.read_to_end(&mut data)?;
        self.decode(&data)
    }

    /// Read dimensions and alpha presence from the header only.
    pub fn probe(&self, data: &[u8]) -> Result<ImageMetadata> {
        if data.is_empty() {
            return Err(Error::DecodeFailure("input is empty".to_string()));
        }
        self.codec.probe(data)
    }
}

/// Encode a raster with libwebp.
pub fn encode_webp(raster: &Raster<'_>, param: &WriteParam) -> Result<EncodedImage> {
    WebPWriter::new().encode(raster, param)
}

/// Encode a raster with libwebp and write it to `sink`.
pub fn write_webp<W: Write + ?Sized>(
    raster: &Raster<'_>,
    param: &WriteParam,
    sink: &mut W,
) -> Result<usize> {
    WebPWriter::new().write(raster, param, sink)
}

/// Decode a complete bitstream with libwebp.
pub fn decode_webp(data: &[u8]) -> Result<DecodedImage> {
    WebPReader::new().decode(data)
}

/// Read and decode a bitstream with libwebp.
pub fn read_webp<R: Read + ?Sized>(source: &mut R) -> Result<DecodedImage> {
    WebPReader::new().read(source)
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::params::CompressionType;
    use crate::pixel::{pack_as, CanonicalLayout};
    use crate::raster::{ColorModel, DirectLayout};
    use proptest::prelude::*;

    fn rgb_raster() -> impl Strategy<Value = Raster<'static>> {
        (1u32..12, 1u32..12).prop_flat_map(|(w, h)| {
            proptest::collection::vec(any::<u8>(), (w * h * 3) as usize)
                .prop_map(move |data| Raster::rgb(data, w, h).unwrap())
        })
    }

    fn byte_model() -> impl Strategy<Value = ColorModel> {
        prop_oneof![
            Just(ColorModel::Direct(DirectLayout::Rgb)),
            Just(ColorModel::Direct(DirectLayout::Bgr)),
            Just(ColorModel::Direct(DirectLayout::Rgba)),
            Just(ColorModel::Direct(DirectLayout::Bgra)),
            Just(ColorModel::Direct(DirectLayout::Argb)),
            Just(ColorModel::Direct(DirectLayout::Abgr)),
            Just(ColorModel::Direct(DirectLayout::Bgrx)),
            Just(ColorModel::Gray { bits: 8 }),
        ]
    }

    fn any_byte_raster() -> impl Strategy<Value = Raster<'static>> {
        (byte_model(), 1u32..12, 1u32..12).prop_flat_map(|(model, w, h)| {
            let len = (w * h) as usize * model.bits_per_pixel() / 8;
            proptest::collection::vec(any::<u8>(), len)
                .prop_map(move |data| Raster::new(data, w, h, model.clone()).unwrap())
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_lossless_round_trip(raster in any_byte_raster(), quality in 0.0f32..=1.0) {
            let param = WriteParam::new()
                .with_compression(CompressionType::Lossless)
                .with_quality(quality);
            let encoded = encode_webp(&raster, &param).unwrap();
            let decoded = decode_webp(encoded.bitstream.as_bytes()).unwrap();

            prop_assert_eq!(decoded.raster.width(), raster.width());
            prop_assert_eq!(decoded.raster.height(), raster.height());

            // An all-opaque alpha source decodes as RGB, so compare as RGBA
            let expected = pack_as(&raster, CanonicalLayout::Rgba).unwrap();
            let actual = pack_as(&decoded.raster, CanonicalLayout::Rgba).unwrap();
            prop_assert_eq!(actual.as_bytes(), expected.as_bytes());
            if !raster.has_alpha() {
                let packed = pack(&raster).unwrap();
                prop_assert_eq!(decoded.raster.pixels(), packed.as_bytes());
            }
        }

        #[test]
        fn prop_lossy_keeps_dimensions(raster in rgb_raster(), quality in 0.0f32..=1.0) {
            let param = WriteParam::new()
                .with_compression(CompressionType::Lossy)
                .with_quality(quality);
            let encoded = encode_webp(&raster, &param).unwrap();
            let decoded = decode_webp(encoded.bitstream.as_bytes()).unwrap();

            prop_assert_eq!(decoded.metadata, encoded.metadata);
        }
    }
}
