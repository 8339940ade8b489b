//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the single capability interface every
//! backend provides: decode bytes into frames, run a transform over frames,
//! and encode frames back into bytes. Two implementations exist:
//!
//! | Backend | Frames | Used for |
//! |---|---|---|
//! | [`AnimatedBackend`](super::animated_backend::AnimatedBackend) | many, coalesced | PNG output, animated GIF/WebP, APNG |
//! | [`RasterBackend`](super::raster_backend::RasterBackend) | exactly one | everything else, and fallback |
//!
//! [`ImageHandle`](super::handle::ImageHandle) picks one at construction and
//! never branches on the kind afterwards. Frames are plain owned buffers, so
//! releasing a backend's resources is just dropping the handle.

use super::params::Quality;
use crate::types::ImageType;
use image::metadata::Orientation;
use image::{Delay, DynamicImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Which capability set a backend provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Decodes every frame of animated input and can write animated GIF.
    Animated,
    /// Decodes and encodes a single frame.
    Raster,
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Animated => "animated",
            BackendKind::Raster => "raster",
        }
    }
}

/// One full-canvas raster image and how long it is shown.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: DynamicImage,
    pub delay: Delay,
}

impl Frame {
    /// A frame with no display delay, as used for still images.
    pub fn still(image: DynamicImage) -> Self {
        Self {
            image,
            delay: Delay::from_numer_denom_ms(0, 1),
        }
    }
}

/// Result of a decode: the frames plus orientation metadata the decoder keeps
/// apart from the pixels.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub frames: Vec<Frame>,
    pub orientation: Orientation,
}

/// Trait for image processing backends.
///
/// `decode` must return at least one frame, all of the same dimensions.
pub trait ImageBackend: Send {
    fn kind(&self) -> BackendKind;

    /// Decode `data`. The content's magic number decides the decoder; `hint`
    /// is used when the content cannot be identified.
    fn decode(
        &self,
        data: &[u8],
        hint: Option<image::ImageFormat>,
    ) -> Result<Decoded, BackendError>;

    /// Encode `frames` as `format`.
    fn encode(
        &self,
        frames: &[Frame],
        format: ImageType,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;

    /// Apply `op` to every frame in place.
    fn transform_frames(&self, frames: &mut [Frame], op: &dyn Fn(&DynamicImage) -> DynamicImage) {
        for frame in frames.iter_mut() {
            frame.image = op(&frame.image);
        }
    }
}
