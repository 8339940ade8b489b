//! Single-frame backend.
//!
//! Decodes exactly one frame and encodes exactly one frame. Animated input
//! decodes to its first frame.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, GIF, WebP, BMP) | `image::ImageReader` with guessed format |
//! | Native orientation | `image::ImageDecoder::orientation` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality 1–100) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (compression from quality) |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//! | Encode → GIF | `image::codecs::gif::GifEncoder` |
//! | Encode → BMP | `image::codecs::bmp::BmpEncoder` |

use super::backend::{BackendError, BackendKind, Decoded, Frame, ImageBackend};
use super::params::Quality;
use crate::types::ImageType;
use image::codecs::bmp::BmpEncoder;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::metadata::Orientation;
use image::{ColorType, DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;

/// Single-frame backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RasterBackend;

impl RasterBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RasterBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode the first (or only) frame of `data`, with its native orientation.
pub(super) fn decode_still(
    data: &[u8],
    hint: Option<ImageFormat>,
) -> Result<Decoded, BackendError> {
    let mut reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
    if reader.format().is_none() {
        match hint {
            Some(format) => reader.set_format(format),
            None => {
                return Err(BackendError::Unsupported(
                    "unrecognized image data".to_string(),
                ));
            }
        }
    }

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to open decoder: {e}")))?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let image = DynamicImage::from_decoder(decoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode: {e}")))?;

    if image.width() == 0 || image.height() == 0 {
        return Err(BackendError::ProcessingFailed(
            "Decoded image has no pixels".to_string(),
        ));
    }

    Ok(Decoded {
        frames: vec![Frame::still(image)],
        orientation,
    })
}

/// Map a 1–100 quality onto the PNG encoder's compression presets.
fn png_compression(quality: Quality) -> CompressionType {
    match quality.value() {
        0..=30 => CompressionType::Fast,
        31..=60 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

/// Keep the channel layout when the encoder accepts it, otherwise 8-bit RGB(A).
fn to_8bit(image: &DynamicImage) -> DynamicImage {
    if image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    }
}

/// Encode a single image as `format`.
pub(super) fn encode_still(
    image: &DynamicImage,
    format: ImageType,
    quality: Quality,
) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::new();
    let result = match format {
        ImageType::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality.value() as u8)),
        ImageType::Png => {
            let encoder =
                PngEncoder::new_with_quality(&mut out, png_compression(quality), PngFilter::Adaptive);
            match image.color() {
                ColorType::Rgb32F | ColorType::Rgba32F => {
                    DynamicImage::ImageRgba16(image.to_rgba16()).write_with_encoder(encoder)
                }
                _ => image.write_with_encoder(encoder),
            }
        }
        ImageType::Webp => to_8bit(image).write_with_encoder(WebPEncoder::new_lossless(&mut out)),
        ImageType::Gif => {
            let mut encoder = GifEncoder::new(&mut out);
            encoder.encode_frame(image::Frame::new(image.to_rgba8()))
        }
        ImageType::Bmp => to_8bit(image).write_with_encoder(BmpEncoder::new(&mut out)),
        ImageType::Unknown => {
            return Err(BackendError::Unsupported(
                "cannot encode an unknown format".to_string(),
            ));
        }
    };
    result.map_err(|e| BackendError::ProcessingFailed(format!("{format} encode failed: {e}")))?;
    Ok(out)
}

impl ImageBackend for RasterBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Raster
    }

    fn decode(&self, data: &[u8], hint: Option<ImageFormat>) -> Result<Decoded, BackendError> {
        decode_still(data, hint)
    }

    fn encode(
        &self,
        frames: &[Frame],
        format: ImageType,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        let frame = frames
            .first()
            .ok_or_else(|| BackendError::ProcessingFailed("No frames to encode".to_string()))?;
        encode_still(&frame.image, format, quality)
    }
}
