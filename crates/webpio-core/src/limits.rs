use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metadata::ImageMetadata;

/// Resource limits applied before a bitstream is decoded.
///
/// All fields default to `None` (no limit).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum size in bytes of the decoded canonical buffer.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// No limits.
    pub fn none() -> Self {
        Self::default()
    }

    /// Check probed image metadata against the limits.
    pub(crate) fn check(&self, meta: &ImageMetadata) -> Result<()> {
        let (width, height) = (meta.width(), meta.height());
        if let Some(max_w) = self.max_width {
            if u64::from(width) > max_w {
                return Err(Error::LimitExceeded(format!(
                    "width {width} exceeds limit {max_w}"
                )));
            }
        }
        if let Some(max_h) = self.max_height {
            if u64::from(height) > max_h {
                return Err(Error::LimitExceeded(format!(
                    "height {height} exceeds limit {max_h}"
                )));
            }
        }
        let pixels = meta.pixel_count();
        if let Some(max_px) = self.max_pixels {
            if pixels > max_px {
                return Err(Error::LimitExceeded(format!(
                    "pixel count {pixels} exceeds limit {max_px}"
                )));
            }
        }
        if let Some(max_mem) = self.max_memory_bytes {
            let bytes = pixels.saturating_mul(meta.channels() as u64);
            if bytes > max_mem {
                return Err(Error::LimitExceeded(format!(
                    "allocation {bytes} bytes exceeds memory limit {max_mem}"
                )));
            }
        }
        Ok(())
    }
}
