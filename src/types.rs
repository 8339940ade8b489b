//! Image type identifiers shared by format resolution, the backends and the CLI.
//!
//! [`ImageType`] is the crate's own vocabulary for raster formats. It maps to
//! MIME types and file extensions in both directions and bridges to
//! [`image::ImageFormat`] for the decoders.

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A recognized raster format, or `Unknown` for content that is probably an
/// image but could not be identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
    Unknown,
}

/// MIME aliases seen in the wild, mapped to their canonical type.
const MIME_TABLE: &[(&str, ImageType)] = &[
    ("image/png", ImageType::Png),
    ("image/jpeg", ImageType::Jpeg),
    ("image/jpg", ImageType::Jpeg),
    ("image/pjpeg", ImageType::Jpeg),
    ("image/gif", ImageType::Gif),
    ("image/webp", ImageType::Webp),
    ("image/bmp", ImageType::Bmp),
    ("image/x-ms-bmp", ImageType::Bmp),
];

const EXTENSION_TABLE: &[(&str, ImageType)] = &[
    ("png", ImageType::Png),
    ("jpg", ImageType::Jpeg),
    ("jpeg", ImageType::Jpeg),
    ("jpe", ImageType::Jpeg),
    ("gif", ImageType::Gif),
    ("webp", ImageType::Webp),
    ("bmp", ImageType::Bmp),
];

impl ImageType {
    /// Look up a MIME type. Parameters after `;` and letter case are ignored.
    ///
    /// Returns `None` for anything that is not one of the supported raster types.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime_essence(mime);
        MIME_TABLE
            .iter()
            .find(|(m, _)| *m == essence)
            .map(|(_, t)| *t)
    }

    /// Look up a bare file extension (no dot), case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        EXTENSION_TABLE
            .iter()
            .find(|(e, _)| e.eq_ignore_ascii_case(ext))
            .map(|(_, t)| *t)
    }

    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::WebP => Some(Self::Webp),
            ImageFormat::Bmp => Some(Self::Bmp),
            _ => None,
        }
    }

    pub fn to_image_format(self) -> Option<ImageFormat> {
        match self {
            Self::Png => Some(ImageFormat::Png),
            Self::Jpeg => Some(ImageFormat::Jpeg),
            Self::Gif => Some(ImageFormat::Gif),
            Self::Webp => Some(ImageFormat::WebP),
            Self::Bmp => Some(ImageFormat::Bmp),
            Self::Unknown => None,
        }
    }

    /// Canonical MIME type. `Unknown` reports the generic `image/*`.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Bmp => "image/bmp",
            Self::Unknown => "image/*",
        }
    }

    /// Preferred file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
            Self::Unknown => "",
        }
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Lower-cased MIME type with parameters and surrounding whitespace removed.
pub(crate) fn mime_essence(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}
