//! Parameter types for image operations.
//!
//! These structs describe *how strongly* to encode, not what to encode. They are
//! resolved once from [`ImageConfig`](crate::config::ImageConfig) before a handle
//! is built and stay fixed for the handle's life.
//!
//! ## Types
//!
//! - [`Quality`]: Encoding quality (1–100, default 90). Clamped on construction.
//! - [`EncodeSettings`]: Per-format quality values plus the animation switch.

use crate::config::ImageConfig;
use crate::types::ImageType;

/// Quality setting for image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// PNG compression levels are stored on a 0-9 scale and used on the
/// 0-100 quality scale.
const PNG_QUALITY_SCALE: u32 = 10;

/// Encoding settings bound to a handle at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    /// zlib-style compression level, 0-9.
    pub png_compression: u8,
    /// Lossy quality for JPEG and WebP.
    pub jpeg_quality: Quality,
    /// Whether the multi-frame backend may be used.
    pub animation: bool,
}

impl EncodeSettings {
    /// Quality to hand to the encoder for `format`.
    pub fn quality_for(&self, format: ImageType) -> Quality {
        match format {
            ImageType::Png => {
                Quality::new(u32::from(self.png_compression.min(9)) * PNG_QUALITY_SCALE)
            }
            _ => self.jpeg_quality,
        }
    }

    /// Same settings with the multi-frame backend switched off.
    pub fn without_animation(self) -> Self {
        Self {
            animation: false,
            ..self
        }
    }
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self::from(&ImageConfig::default())
    }
}

impl From<&ImageConfig> for EncodeSettings {
    fn from(config: &ImageConfig) -> Self {
        Self {
            png_compression: config.quality.png_compression,
            jpeg_quality: Quality::new(config.quality.jpeg_quality),
            animation: config.backend.animation,
        }
    }
}
