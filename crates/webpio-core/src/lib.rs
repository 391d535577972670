//! webpio Core - WebP read/write adapter
//!
//! This crate connects a raster-oriented image pipeline to libwebp. It turns
//! rasters in any supported color model (direct RGB/RGBA orders, grayscale,
//! indexed) into a canonical 8-bit RGB or RGBA buffer, validates compression
//! parameters, hands the buffer to the codec, and moves whole bitstreams in
//! and out of byte streams.
//!
//! # Example
//!
//! ```ignore
//! use webpio_core::{decode_webp, write_webp, CompressionType, Raster, WriteParam};
//!
//! let raster = Raster::rgb(vec![200u8, 100, 50].repeat(16), 4, 4)?;
//! let param = WriteParam::new().with_compression(CompressionType::Lossless);
//!
//! let mut bytes = Vec::new();
//! write_webp(&raster, &param, &mut bytes)?;
//! let decoded = decode_webp(&bytes)?;
//! assert_eq!(decoded.raster.pixels(), raster.pixels());
//! ```

pub mod codec;
pub mod error;
mod interop;
pub mod limits;
pub mod metadata;
pub mod params;
pub mod pixel;
pub mod raster;
pub mod scale;
pub mod stream;

pub use codec::{Bitstream, LibWebp, WebPCodec};
pub use error::{Error, Result};
pub use limits::Limits;
pub use metadata::ImageMetadata;
pub use params::{CompressionType, EncodeParameters, WriteParam, DEFAULT_QUALITY};
pub use pixel::{pack, pack_as, unpack, CanonicalBuffer, CanonicalLayout};
pub use raster::{ColorModel, DirectLayout, Palette, Raster};
pub use scale::{resize, scale, FilterType};
pub use stream::{
    decode_webp, encode_webp, read_webp, write_webp, DecodedImage, EncodedImage, WebPReader,
    WebPWriter,
};

/// Re-exported so callers can build palettes without naming `rgb` directly.
pub use rgb::{RGB8, RGBA8};
