//! Multi-frame, animation-aware backend.
//!
//! Animated GIF, animated WebP and APNG decode into every frame. Frames are
//! coalesced on decode: each one is composited over the frames before it so
//! that every [`Frame`] is a complete, independent canvas. Later transforms
//! can then treat frames uniformly.
//!
//! Static input is delegated to the single-frame decoder. On encode, GIF
//! output keeps all frames and their delays; every other format is flattened
//! to the first frame.

use super::backend::{BackendError, BackendKind, Decoded, Frame, ImageBackend};
use super::params::Quality;
use super::raster_backend::{decode_still, encode_still};
use crate::types::ImageType;
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::metadata::Orientation;
use image::{AnimationDecoder, DynamicImage, Frames, ImageDecoder, ImageFormat, RgbaImage};
use std::io::Cursor;
use tracing::debug;

/// Multi-frame backend using the `image` crate's animation decoders.
pub struct AnimatedBackend;

impl AnimatedBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AnimatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn failed(context: &str) -> impl Fn(image::ImageError) -> BackendError + '_ {
    move |e| BackendError::ProcessingFailed(format!("{context}: {e}"))
}

/// Composite decoded frames onto a canvas of `canvas` size.
///
/// Full-canvas frames replace the composite; partial frames are drawn over
/// the previous composite at their offset.
fn coalesce(canvas: (u32, u32), frames: Frames<'_>) -> Result<Vec<Frame>, BackendError> {
    let (width, height) = canvas;
    if width == 0 || height == 0 {
        return Err(BackendError::ProcessingFailed(
            "Animation canvas has no pixels".to_string(),
        ));
    }

    let mut composite = RgbaImage::new(width, height);
    let mut coalesced = Vec::new();

    for frame in frames {
        let frame = frame.map_err(failed("Failed to decode frame"))?;
        let (left, top, delay) = (frame.left(), frame.top(), frame.delay());
        let buffer = frame.into_buffer();

        if left == 0 && top == 0 && buffer.dimensions() == canvas {
            composite = buffer;
        } else {
            image::imageops::overlay(&mut composite, &buffer, i64::from(left), i64::from(top));
        }

        coalesced.push(Frame {
            image: DynamicImage::ImageRgba8(composite.clone()),
            delay,
        });
    }

    if coalesced.is_empty() {
        return Err(BackendError::ProcessingFailed(
            "Animation has no frames".to_string(),
        ));
    }
    Ok(coalesced)
}

fn animated(frames: Vec<Frame>) -> Decoded {
    Decoded {
        frames,
        orientation: Orientation::NoTransforms,
    }
}

impl ImageBackend for AnimatedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Animated
    }

    fn decode(&self, data: &[u8], hint: Option<ImageFormat>) -> Result<Decoded, BackendError> {
        let format = image::guess_format(data).ok().or(hint).ok_or_else(|| {
            BackendError::Unsupported("unrecognized image data".to_string())
        })?;

        match format {
            ImageFormat::Gif => {
                let decoder =
                    GifDecoder::new(Cursor::new(data)).map_err(failed("Failed to open GIF"))?;
                let canvas = decoder.dimensions();
                coalesce(canvas, decoder.into_frames()).map(animated)
            }
            ImageFormat::WebP => {
                let decoder =
                    WebPDecoder::new(Cursor::new(data)).map_err(failed("Failed to open WebP"))?;
                if !decoder.has_animation() {
                    return decode_still(data, Some(format));
                }
                let canvas = decoder.dimensions();
                coalesce(canvas, decoder.into_frames()).map(animated)
            }
            ImageFormat::Png => {
                let decoder =
                    PngDecoder::new(Cursor::new(data)).map_err(failed("Failed to open PNG"))?;
                if !decoder.is_apng().map_err(failed("Failed to read PNG"))? {
                    return decode_still(data, Some(format));
                }
                let canvas = decoder.dimensions();
                let apng = decoder.apng().map_err(failed("Failed to open APNG"))?;
                coalesce(canvas, apng.into_frames()).map(animated)
            }
            other => decode_still(data, Some(other)),
        }
    }

    fn encode(
        &self,
        frames: &[Frame],
        format: ImageType,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        let first = frames
            .first()
            .ok_or_else(|| BackendError::ProcessingFailed("No frames to encode".to_string()))?;

        if format == ImageType::Gif && frames.len() > 1 {
            let mut out = Vec::new();
            {
                let mut encoder = GifEncoder::new(&mut out);
                encoder
                    .set_repeat(Repeat::Infinite)
                    .map_err(failed("GIF encode failed"))?;
                encoder
                    .encode_frames(frames.iter().map(|f| {
                        image::Frame::from_parts(f.image.to_rgba8(), 0, 0, f.delay)
                    }))
                    .map_err(failed("GIF encode failed"))?;
            }
            return Ok(out);
        }

        if frames.len() > 1 {
            debug!(frames = frames.len(), format = %format, "Flattening animation to first frame");
        }
        encode_still(&first.image, format, quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        animated_gif_bytes, animated_webp_bytes, apng_bytes, jpeg_bytes, png_bytes, webp_bytes,
    };
    use image::{Delay, GenericImageView, Rgba};

    #[test]
    fn decode_animated_gif_keeps_every_frame() {
        let decoded = AnimatedBackend::new()
            .decode(&animated_gif_bytes(16, 12, 3), None)
            .unwrap();
        assert_eq!(decoded.frames.len(), 3);
        for frame in &decoded.frames {
            assert_eq!(frame.image.dimensions(), (16, 12));
        }
        // Frames are red, green, blue in turn
        assert_eq!(decoded.frames[0].image.get_pixel(4, 4), Rgba([255, 0, 0, 255]));
        assert_eq!(decoded.frames[1].image.get_pixel(4, 4), Rgba([0, 255, 0, 255]));
        assert_eq!(decoded.frames[2].image.get_pixel(4, 4), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn decode_apng_keeps_every_frame() {
        let decoded = AnimatedBackend::new()
            .decode(&apng_bytes(10, 6, 3), None)
            .unwrap();
        assert_eq!(decoded.frames.len(), 3);
        for frame in &decoded.frames {
            assert_eq!(frame.image.dimensions(), (10, 6));
        }
        assert_eq!(decoded.frames[0].image.get_pixel(9, 5), Rgba([255, 0, 0, 255]));
        assert_eq!(decoded.frames[2].image.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn decode_animated_webp_keeps_every_frame() {
        let decoded = AnimatedBackend::new()
            .decode(&animated_webp_bytes(8, 6, 3), None)
            .unwrap();
        assert_eq!(decoded.frames.len(), 3);
        for frame in &decoded.frames {
            assert_eq!(frame.image.dimensions(), (8, 6));
        }
        assert_eq!(decoded.frames[1].image.get_pixel(3, 3), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn decode_static_webp_is_single_frame() {
        let decoded = AnimatedBackend::new().decode(&webp_bytes(12, 9), None).unwrap();
        assert_eq!(decoded.frames.len(), 1);
        assert_eq!(decoded.frames[0].image.dimensions(), (12, 9));
    }

    #[test]
    fn decode_static_png_is_single_frame() {
        let decoded = AnimatedBackend::new().decode(&png_bytes(20, 10), None).unwrap();
        assert_eq!(decoded.frames.len(), 1);
        assert_eq!(decoded.frames[0].image.dimensions(), (20, 10));
    }

    #[test]
    fn decode_jpeg_delegates_to_still_decoder() {
        let decoded = AnimatedBackend::new().decode(&jpeg_bytes(20, 10), None).unwrap();
        assert_eq!(decoded.frames.len(), 1);
    }

    #[test]
    fn decode_garbage_fails() {
        assert!(AnimatedBackend::new().decode(b"GIF89a-broken", None).is_err());
        assert!(AnimatedBackend::new().decode(b"????", None).is_err());
    }

    #[test]
    fn coalesce_draws_partial_frames_over_previous() {
        let base = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        let patch = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 255]));
        let delay = Delay::from_numer_denom_ms(50, 1);
        let frames = Frames::new(Box::new(
            vec![
                Ok(image::Frame::from_parts(base, 0, 0, delay)),
                Ok(image::Frame::from_parts(patch, 2, 2, delay)),
            ]
            .into_iter(),
        ));

        let coalesced = coalesce((4, 4), frames).unwrap();
        assert_eq!(coalesced.len(), 2);
        let second = &coalesced[1].image;
        assert_eq!(second.dimensions(), (4, 4));
        assert_eq!(second.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(second.get_pixel(3, 3), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn coalesce_rejects_empty_canvas() {
        let frames = Frames::new(Box::new(std::iter::empty()));
        assert!(coalesce((0, 4), frames).is_err());
    }

    #[test]
    fn encode_gif_keeps_animation() {
        let backend = AnimatedBackend::new();
        let decoded = backend.decode(&animated_gif_bytes(8, 8, 3), None).unwrap();
        let bytes = backend
            .encode(&decoded.frames, ImageType::Gif, Quality::default())
            .unwrap();

        let again = backend.decode(&bytes, None).unwrap();
        assert_eq!(again.frames.len(), 3);
    }

    #[test]
    fn encode_png_flattens_to_first_frame() {
        let backend = AnimatedBackend::new();
        let decoded = backend.decode(&animated_gif_bytes(8, 8, 3), None).unwrap();
        let bytes = backend
            .encode(&decoded.frames, ImageType::Png, Quality::default())
            .unwrap();

        let again = backend.decode(&bytes, None).unwrap();
        assert_eq!(again.frames.len(), 1);
        assert_eq!(again.frames[0].image.get_pixel(1, 1), Rgba([255, 0, 0, 255]));
    }
}
