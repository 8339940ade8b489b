//! Format resolution and animation sniffing.
//!
//! Uploads are frequently mislabeled, so the format is guessed before any
//! backend is chosen. Precedence is explicit:
//!
//! 1. A declared MIME type naming a supported raster format wins.
//! 2. Otherwise the content's magic number decides.
//! 3. Otherwise the filename extension decides.
//! 4. Otherwise the declared MIME type is classified as-is.
//!
//! A resolved type that is empty, `image/*` or a generic binary type is
//! treated as an unidentified image and later re-encoded as WebP. Anything
//! else is rejected without a decode attempt.

use crate::types::{ImageType, mime_essence};
use std::path::Path;
use tracing::debug;

/// Declared types that say "some bytes" rather than "not an image".
const GENERIC_BINARY_TYPES: &[&str] = &[
    "application/octet-stream",
    "application/binary",
    "binary/octet-stream",
];

/// How many leading bytes of a WebP file are searched for an animation chunk.
const WEBP_HEADER_LEN: usize = 90;

/// Outcome of format resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A supported raster format.
    Known(ImageType),
    /// Probably an image, format not identified. Carries the resolved MIME type.
    Unidentified(String),
    /// Not something this crate handles. Carries the resolved MIME type.
    Unsupported(String),
}

impl Resolution {
    /// Origin and output types, or `None` for unsupported content.
    ///
    /// Unidentified content is always re-encoded as WebP.
    pub fn types(&self) -> Option<(ImageType, ImageType)> {
        match self {
            Resolution::Known(t) => Some((*t, *t)),
            Resolution::Unidentified(_) => Some((ImageType::Unknown, ImageType::Webp)),
            Resolution::Unsupported(_) => None,
        }
    }
}

/// Resolve the format of `data` from its declared MIME type, content and filename.
pub fn resolve(data: &[u8], declared_mime: &str, filename: &str) -> Resolution {
    let declared = mime_essence(declared_mime);

    if let Some(t) = ImageType::from_mime(&declared) {
        return Resolution::Known(t);
    }

    if let Some(t) = sniff_content(data) {
        debug!(declared = %declared, sniffed = %t, "Declared type overridden by content");
        return Resolution::Known(t);
    }

    if let Some(t) = type_from_filename(filename) {
        debug!(declared = %declared, filename, resolved = %t, "Type taken from file extension");
        return Resolution::Known(t);
    }

    if is_probably_image(&declared) {
        debug!(declared = %declared, "Unhandled image type, output will be WebP");
        Resolution::Unidentified(declared)
    } else {
        debug!(declared = %declared, "Unhandled mime type");
        Resolution::Unsupported(declared)
    }
}

/// Identify a supported format from magic numbers.
pub fn sniff_content(data: &[u8]) -> Option<ImageType> {
    image::guess_format(data)
        .ok()
        .and_then(ImageType::from_image_format)
}

fn type_from_filename(filename: &str) -> Option<ImageType> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ImageType::from_extension)
}

fn is_probably_image(mime: &str) -> bool {
    mime.is_empty() || mime.starts_with("image/") || GENERIC_BINARY_TYPES.contains(&mime)
}

/// Whether a GIF stream contains a graphic control extension followed by
/// another image or extension block, the marker of frame-timed animation.
///
/// Matches `00 21 F9 04 ?? ?? ?? ?? 00 (2C|21)` anywhere in the stream.
pub fn is_animated_gif(data: &[u8]) -> bool {
    data.windows(10).any(|w| {
        w[0] == 0x00
            && w[1] == 0x21
            && w[2] == 0xF9
            && w[3] == 0x04
            && w[8] == 0x00
            && (w[9] == 0x2C || w[9] == 0x21)
    })
}

/// Whether a WebP stream declares animation in its first chunk.
///
/// The layout checked is `RIFF <size:4> WEBP VP8? <chunk...>`, with `ANIM` or
/// `ANMF` somewhere in the first 90 bytes after the `VP8?` tag. Comparisons
/// ignore ASCII case.
pub fn is_animated_webp(data: &[u8]) -> bool {
    if data.len() < 16 {
        return false;
    }
    let header = &data[..data.len().min(WEBP_HEADER_LEN)];

    if !header[0..4].eq_ignore_ascii_case(b"RIFF") || !header[8..12].eq_ignore_ascii_case(b"WEBP")
    {
        return false;
    }
    if !contains_ignore_case(&header[12..16], b"VP8") {
        return false;
    }
    let chunk = &header[16..];
    contains_ignore_case(chunk, b"ANIM") || contains_ignore_case(chunk, b"ANMF")
}

fn contains_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|w| w.eq_ignore_ascii_case(needle))
}
