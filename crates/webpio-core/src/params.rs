//! Encode parameters: the caller-facing request and its validated snapshot.
//!
//! [`WriteParam`] is set field by field and may hold anything the caller
//! asked for, including unknown compression type names. Only
//! [`WriteParam::validate`] turns it into an [`EncodeParameters`], the
//! immutable value the codec receives.
//!
//! # Quality
//!
//! Quality is a factor in `0.0..=1.0` for both compression types:
//!
//! * Lossy: 0.0 = smallest file / lowest fidelity, 1.0 = largest file /
//!   highest fidelity
//! * Lossless: output is always exact; quality trades encoding effort for
//!   size, 0.0 = fastest, 1.0 = slowest and smallest

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Quality used when none is requested.
pub const DEFAULT_QUALITY: f32 = 0.75;

/// libwebp `method` used for lossy encoding (libwebp's own default).
pub const LOSSY_METHOD: u8 = 4;

/// Highest libwebp `method` (slowest, best compression).
pub const MAX_METHOD: u8 = 6;

/// WebP compression mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompressionType {
    /// VP8 lossy compression.
    #[default]
    Lossy,
    /// VP8L lossless compression.
    Lossless,
}

impl CompressionType {
    /// Every supported compression type, in the order writers advertise them.
    pub const ALL: [CompressionType; 2] = [CompressionType::Lossy, CompressionType::Lossless];

    /// The name accepted by [`WriteParam::set_compression_type`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Lossy => "Lossy",
            Self::Lossless => "Lossless",
        }
    }

    pub fn is_lossless(self) -> bool {
        self == Self::Lossless
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompressionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::UnsupportedCompressionType(s.to_string()))
    }
}

/// Mutable encode request, validated into [`EncodeParameters`] before use.
///
/// # Example
///
/// ```ignore
/// let mut param = WriteParam::new();
/// param.set_compression_type("Lossless");
/// param.set_compression_quality(1.0);
/// let params = param.validate()?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteParam {
    /// Requested compression type name; `None` means Lossy.
    compression_type: Option<String>,
    /// Requested quality; `None` means [`DEFAULT_QUALITY`].
    compression_quality: Option<f32>,
}

impl WriteParam {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a compression type by name (`"Lossy"` or `"Lossless"`).
    ///
    /// The name is checked by [`WriteParam::validate`].
    pub fn set_compression_type(&mut self, name: impl Into<String>) {
        self.compression_type = Some(name.into());
    }

    /// Request a compression type.
    pub fn set_compression(&mut self, compression: CompressionType) {
        self.compression_type = Some(compression.name().to_string());
    }

    /// Request a compression quality in `0.0..=1.0`.
    ///
    /// The value is checked by [`WriteParam::validate`].
    pub fn set_compression_quality(&mut self, quality: f32) {
        self.compression_quality = Some(quality);
    }

    /// Forget the requested compression type and quality.
    pub fn unset_compression(&mut self) {
        self.compression_type = None;
        self.compression_quality = None;
    }

    /// Builder form of [`WriteParam::set_compression`].
    pub fn with_compression(mut self, compression: CompressionType) -> Self {
        self.set_compression(compression);
        self
    }

    /// Builder form of [`WriteParam::set_compression_quality`].
    pub fn with_quality(mut self, quality: f32) -> Self {
        self.set_compression_quality(quality);
        self
    }

    pub fn compression_type(&self) -> Option<&str> {
        self.compression_type.as_deref()
    }

    pub fn compression_quality(&self) -> Option<f32> {
        self.compression_quality
    }

    /// Resolve defaults and check the request.
    ///
    /// The compression type is checked first, then the quality.
    ///
    /// # Errors
    ///
    /// - `Error::UnsupportedCompressionType` for an unknown type name
    /// - `Error::InvalidQuality` for a quality outside `0.0..=1.0` (or NaN)
    pub fn validate(&self) -> Result<EncodeParameters> {
        let compression_type = match self.compression_type.as_deref() {
            Some(name) => name.parse()?,
            None => CompressionType::Lossy,
        };
        let quality = self.compression_quality.unwrap_or(DEFAULT_QUALITY);
        EncodeParameters::new(compression_type, quality)
    }
}

/// Validated, immutable encode parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EncodeParameters {
    compression_type: CompressionType,
    quality: f32,
}

impl Default for EncodeParameters {
    fn default() -> Self {
        Self {
            compression_type: CompressionType::Lossy,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl EncodeParameters {
    /// # Errors
    ///
    /// Returns `Error::InvalidQuality` if `quality` is outside `0.0..=1.0`.
    pub fn new(compression_type: CompressionType, quality: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&quality) {
            return Err(Error::InvalidQuality(quality));
        }
        Ok(Self {
            compression_type,
            quality,
        })
    }

    pub fn compression_type(&self) -> CompressionType {
        self.compression_type
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Settings in the units libwebp expects.
    pub fn codec_settings(&self) -> CodecSettings {
        let lossless = self.compression_type.is_lossless();
        let method = if lossless {
            (self.quality * f32::from(MAX_METHOD)).round() as u8
        } else {
            LOSSY_METHOD
        };
        CodecSettings {
            lossless,
            quality: self.quality * 100.0,
            method,
            exact: lossless,
        }
    }
}

/// Codec-ready encoder settings derived from [`EncodeParameters`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodecSettings {
    /// Use the VP8L lossless encoder.
    pub lossless: bool,
    /// libwebp quality, 0 to 100.
    pub quality: f32,
    /// libwebp speed/effort trade-off, 0 (fast) to 6 (slow).
    pub method: u8,
    /// Keep RGB values under fully transparent pixels.
    pub exact: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compression_type() {
        assert_eq!("Lossy".parse::<CompressionType>().unwrap(), CompressionType::Lossy);
        assert_eq!(
            "Lossless".parse::<CompressionType>().unwrap(),
            CompressionType::Lossless
        );
        assert!(matches!(
            "lossless".parse::<CompressionType>(),
            Err(Error::UnsupportedCompressionType(name)) if name == "lossless"
        ));
        assert!(matches!(
            "".parse::<CompressionType>(),
            Err(Error::UnsupportedCompressionType(_))
        ));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for t in CompressionType::ALL {
            assert_eq!(t.to_string().parse::<CompressionType>().unwrap(), t);
        }
    }

    #[test]
    fn test_defaults() {
        let params = WriteParam::new().validate().unwrap();
        assert_eq!(params.compression_type(), CompressionType::Lossy);
        assert_eq!(params.quality(), DEFAULT_QUALITY);
        assert_eq!(params, EncodeParameters::default());
    }

    #[test]
    fn test_default_type_with_explicit_quality() {
        let mut param = WriteParam::new();
        param.set_compression_quality(0.3);
        let params = param.validate().unwrap();
        assert_eq!(params.compression_type(), CompressionType::Lossy);
        assert_eq!(params.quality(), 0.3);
    }

    #[test]
    fn test_unset_compression_restores_defaults() {
        let mut param = WriteParam::new();
        param.set_compression(CompressionType::Lossless);
        param.set_compression_quality(0.1);
        param.unset_compression();
        assert_eq!(param.validate().unwrap(), EncodeParameters::default());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut param = WriteParam::new();
        param.set_compression_type("Lossier");
        assert!(matches!(
            param.validate(),
            Err(Error::UnsupportedCompressionType(_))
        ));
    }

    #[test]
    fn test_type_checked_before_quality() {
        let mut param = WriteParam::new();
        param.set_compression_type("JPEG");
        param.set_compression_quality(7.0);
        assert!(matches!(
            param.validate(),
            Err(Error::UnsupportedCompressionType(_))
        ));
    }

    #[test]
    fn test_quality_boundaries() {
        for t in CompressionType::ALL {
            for q in [0.0, 1.0] {
                let params = WriteParam::new()
                    .with_compression(t)
                    .with_quality(q)
                    .validate()
                    .unwrap();
                assert_eq!(params.quality(), q);
                assert_eq!(params.compression_type(), t);
            }
            for q in [-0.01, 1.01, f32::NAN, f32::INFINITY] {
                let result = WriteParam::new().with_compression(t).with_quality(q).validate();
                assert!(
                    matches!(result, Err(Error::InvalidQuality(_))),
                    "quality {q} for {t} should be rejected"
                );
            }
        }
    }

    #[test]
    fn test_lossy_codec_settings() {
        let params = EncodeParameters::new(CompressionType::Lossy, 0.9).unwrap();
        let settings = params.codec_settings();
        assert!(!settings.lossless);
        assert!(!settings.exact);
        assert_eq!(settings.method, LOSSY_METHOD);
        assert!((settings.quality - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_lossless_quality_maps_to_effort() {
        let method = |q| {
            EncodeParameters::new(CompressionType::Lossless, q)
                .unwrap()
                .codec_settings()
                .method
        };
        assert_eq!(method(0.0), 0);
        assert_eq!(method(0.5), 3);
        assert_eq!(method(1.0), MAX_METHOD);

        let settings = EncodeParameters::new(CompressionType::Lossless, 0.5)
            .unwrap()
            .codec_settings();
        assert!(settings.lossless);
        assert!(settings.exact);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
