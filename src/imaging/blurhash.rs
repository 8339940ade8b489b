//! Blur-hash placeholders.
//!
//! A blur-hash is a short string describing the rough colors of an image,
//! shown while the real image loads. Encoding works on a copy shrunk to at
//! most [`WORKING_SIZE`] pixels on its longer edge; decoding renders at that
//! size and scales up to the requested placeholder size.

use super::calculations::scaling_dimensions;
use super::handle::{ImageError, ImageHandle};
use super::params::EncodeSettings;
use super::raster_backend::RasterBackend;
use crate::types::ImageType;
use image::{DynamicImage, Rgb, RgbImage};
use tracing::warn;

/// Horizontal and vertical component count of generated hashes.
pub const COMPONENTS: u32 = 9;

/// Longest edge, in pixels, of the image a hash is computed from or rendered at.
pub const WORKING_SIZE: u32 = 90;

/// Blur-hash of `data`, decoded as a single frame.
///
/// Returns `None` when the data cannot be decoded.
pub fn encode(data: &[u8], mime: &str, settings: &EncodeSettings) -> Option<String> {
    hash_handle(ImageHandle::new_static(data, mime, "", settings))
}

/// Hash the first frame of `handle`, shrinking it first.
pub(crate) fn hash_handle(mut handle: ImageHandle) -> Option<String> {
    if !handle.is_valid() {
        return None;
    }
    if let Err(e) = handle.scale_down(WORKING_SIZE) {
        warn!(error = %e, "Cannot shrink image for blur-hash");
        return None;
    }
    let image = handle.into_image()?;
    let (width, height) = (image.width(), image.height());

    // Only color matters, alpha is forced opaque
    let pixels: Vec<u8> = image
        .to_rgb8()
        .pixels()
        .flat_map(|p| [p[0], p[1], p[2], 255])
        .collect();

    match ::blurhash::encode(COMPONENTS, COMPONENTS, width, height, &pixels) {
        Ok(hash) => Some(hash),
        Err(e) => {
            warn!(error = ?e, width, height, "Blur-hash encoding failed");
            None
        }
    }
}

/// Render `hash` as a PNG placeholder for an image of `width`x`height`.
///
/// The hash is rendered with the same aspect ratio at no more than
/// [`WORKING_SIZE`] pixels (at least 1 per edge), then scaled up so its
/// shorter edge reaches `min(width, height)`. An undecodable hash or a zero
/// size yields an invalid handle.
pub fn decode(hash: &str, width: u32, height: u32, settings: &EncodeSettings) -> ImageHandle {
    let settings = settings.without_animation();
    if width == 0 || height == 0 {
        return ImageHandle::invalid(
            settings,
            Box::new(RasterBackend::new()),
            ImageError::InvalidGeometry(format!("placeholder size {width}x{height}")),
        );
    }

    let (render_w, render_h) =
        scaling_dimensions(width, height, WORKING_SIZE).unwrap_or((width, height));

    let pixels = match ::blurhash::decode(hash, render_w, render_h, 1.0) {
        Ok(pixels) => pixels,
        Err(e) => {
            warn!(error = ?e, hash, "Blur-hash decoding failed");
            return ImageHandle::invalid(
                settings,
                Box::new(RasterBackend::new()),
                ImageError::DecodeFailure(format!("invalid blur-hash {hash:?}")),
            );
        }
    };

    let canvas = RgbImage::from_fn(render_w, render_h, |x, y| {
        let i = ((y * render_w + x) * 4) as usize;
        Rgb([pixels[i], pixels[i + 1], pixels[i + 2]])
    });

    let mut handle =
        ImageHandle::from_image(DynamicImage::ImageRgb8(canvas), ImageType::Png, &settings);
    if let Err(e) = handle.scale_up(width.min(height)) {
        warn!(error = %e, width, height, "Cannot scale blur-hash placeholder");
    }
    handle
}
