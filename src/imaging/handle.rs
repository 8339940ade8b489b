//! The image handle: one decoded upload and everything that can be done to it.
//!
//! An [`ImageHandle`] is built from raw bytes, a declared MIME type and a
//! filename hint. Construction never fails outright: content that cannot be
//! used produces an *invalid* handle that remembers why
//! ([`ImageHandle::failure`]), and every later operation on it returns an
//! error instead of panicking.
//!
//! ## Lifecycle
//!
//! ```text
//! bytes + mime + filename
//!   → format resolution      (sniff::resolve)
//!   → backend selection      (animated if wanted and available, else raster)
//!   → frames in memory       (mutated by scale/crop/rotate/flip/orient/to_static)
//!   → to_bytes / blur_hash
//! ```
//!
//! The backend is chosen once. It can degrade from animated to raster while
//! binding, never the other way round, and the handle never branches on the
//! backend kind after construction.

use super::animated_backend::AnimatedBackend;
use super::backend::{BackendError, BackendKind, Decoded, Frame, ImageBackend};
use super::calculations::{clamp_crop, quarter_turns, scale_up_dimensions, scaling_dimensions};
use super::orientation::{self, ExifData, TOP_LEFT};
use super::params::EncodeSettings;
use super::raster_backend::RasterBackend;
use super::sniff;
use crate::types::ImageType;
use image::DynamicImage;
use image::imageops::FilterType;
use image::metadata::Orientation;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Decode failed: {0}")]
    DecodeFailure(String),
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("Image handle is not valid")]
    InvalidHandle,
    #[error("Encode failed: {0}")]
    EncodeFailure(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for image handle operations.
pub type Result<T> = std::result::Result<T, ImageError>;

fn decode_error(e: BackendError) -> ImageError {
    match e {
        BackendError::Io(e) => ImageError::Io(e),
        BackendError::ProcessingFailed(msg) | BackendError::Unsupported(msg) => {
            ImageError::DecodeFailure(msg)
        }
    }
}

fn encode_error(e: BackendError) -> ImageError {
    match e {
        BackendError::Io(e) => ImageError::Io(e),
        BackendError::ProcessingFailed(msg) | BackendError::Unsupported(msg) => {
            ImageError::EncodeFailure(msg)
        }
    }
}

/// A decoded image bound to one backend.
pub struct ImageHandle {
    origin_type: ImageType,
    output_type: ImageType,
    backend: Box<dyn ImageBackend>,
    frames: Vec<Frame>,
    settings: EncodeSettings,
    native_orientation: Orientation,
    exif: Option<ExifData>,
    failure: Option<ImageError>,
}

impl ImageHandle {
    /// Decode `data`, choosing the backend from the content and `settings`.
    pub fn new(data: &[u8], mime: &str, filename: &str, settings: &EncodeSettings) -> Self {
        Self::bind(
            data,
            mime,
            filename,
            *settings,
            Box::new(AnimatedBackend::new()),
            Box::new(RasterBackend::new()),
        )
    }

    /// Decode `data` on the single-frame backend regardless of content.
    pub fn new_static(data: &[u8], mime: &str, filename: &str, settings: &EncodeSettings) -> Self {
        Self::new(data, mime, filename, &settings.without_animation())
    }

    /// Like [`new`](Self::new), but returns the failure of an invalid handle.
    pub fn try_new(
        data: &[u8],
        mime: &str,
        filename: &str,
        settings: &EncodeSettings,
    ) -> Result<Self> {
        let mut handle = Self::new(data, mime, filename, settings);
        match handle.failure.take() {
            Some(e) => Err(e),
            None => Ok(handle),
        }
    }

    /// Wrap an already decoded image. `Unknown` output becomes WebP.
    pub fn from_image(image: DynamicImage, output: ImageType, settings: &EncodeSettings) -> Self {
        let output_type = if output.is_known() {
            output
        } else {
            ImageType::Webp
        };
        Self::bound(
            output,
            output_type,
            Box::new(RasterBackend::new()),
            Decoded {
                frames: vec![Frame::still(image)],
                orientation: Orientation::NoTransforms,
            },
            *settings,
            None,
        )
    }

    pub(crate) fn bind(
        data: &[u8],
        mime: &str,
        filename: &str,
        settings: EncodeSettings,
        animated: Box<dyn ImageBackend>,
        raster: Box<dyn ImageBackend>,
    ) -> Self {
        let Some((origin_type, output_type)) = sniff::resolve(data, mime, filename).types() else {
            warn!(mime, filename, "Unsupported mime type, not decoding");
            return Self::invalid(
                settings,
                raster,
                ImageError::UnsupportedFormat(mime.to_string()),
            );
        };

        let hint = origin_type.to_image_format();
        let animated_webp = sniff::is_animated_webp(data);
        let wants_animation =
            output_type == ImageType::Png || animated_webp || sniff::is_animated_gif(data);
        let exif = if origin_type == ImageType::Jpeg {
            orientation::read_exif(data)
        } else {
            None
        };

        if settings.animation && wants_animation {
            match animated.decode(data, hint) {
                Ok(decoded) => {
                    return Self::bound(origin_type, output_type, animated, decoded, settings, exif);
                }
                Err(e) => {
                    warn!(error = %e, origin = %origin_type, "Animated backend failed, falling back to raster");
                }
            }
        }

        if animated_webp {
            warn!(filename, "Animated WebP is not supported without the animated backend");
            let mut handle = Self::invalid(
                settings,
                raster,
                ImageError::BackendUnavailable(
                    "animated WebP requires the multi-frame backend".to_string(),
                ),
            );
            handle.origin_type = origin_type;
            handle.output_type = output_type;
            return handle;
        }

        match raster.decode(data, hint) {
            Ok(decoded) => Self::bound(origin_type, output_type, raster, decoded, settings, exif),
            Err(e) => {
                debug!(error = %e, origin = %origin_type, filename, "Decode failed");
                let mut handle = Self::invalid(settings, raster, decode_error(e));
                handle.origin_type = origin_type;
                handle.output_type = output_type;
                handle
            }
        }
    }

    fn bound(
        origin_type: ImageType,
        output_type: ImageType,
        backend: Box<dyn ImageBackend>,
        decoded: Decoded,
        settings: EncodeSettings,
        exif: Option<ExifData>,
    ) -> Self {
        let usable = decoded
            .frames
            .first()
            .is_some_and(|f| f.image.width() > 0 && f.image.height() > 0);
        let failure = if usable {
            debug!(
                origin = %origin_type,
                output = %output_type,
                backend = backend.kind().name(),
                frames = decoded.frames.len(),
                "Image bound"
            );
            None
        } else {
            Some(ImageError::DecodeFailure(
                "decoder produced no pixels".to_string(),
            ))
        };

        Self {
            origin_type,
            output_type,
            backend,
            frames: if usable { decoded.frames } else { Vec::new() },
            settings,
            native_orientation: decoded.orientation,
            exif,
            failure,
        }
    }

    /// A handle that holds no pixels and reports `error` from every operation.
    pub(crate) fn invalid(
        settings: EncodeSettings,
        backend: Box<dyn ImageBackend>,
        error: ImageError,
    ) -> Self {
        Self {
            origin_type: ImageType::Unknown,
            output_type: ImageType::Webp,
            backend,
            frames: Vec::new(),
            settings,
            native_orientation: Orientation::NoTransforms,
            exif: None,
            failure: Some(error),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn is_valid(&self) -> bool {
        self.failure.is_none() && !self.frames.is_empty()
    }

    /// Why the handle is invalid, if it is.
    pub fn failure(&self) -> Option<&ImageError> {
        self.failure.as_ref()
    }

    /// Width in pixels, 0 for an invalid handle.
    pub fn width(&self) -> u32 {
        self.frames.first().map_or(0, |f| f.image.width())
    }

    /// Height in pixels, 0 for an invalid handle.
    pub fn height(&self) -> u32 {
        self.frames.first().map_or(0, |f| f.image.height())
    }

    pub fn origin_type(&self) -> ImageType {
        self.origin_type
    }

    pub fn output_type(&self) -> ImageType {
        self.output_type
    }

    /// MIME type of the bytes [`to_bytes`](Self::to_bytes) produces.
    pub fn mime_type(&self) -> &'static str {
        self.output_type.mime_type()
    }

    pub fn origin_mime_type(&self) -> &'static str {
        self.origin_type.mime_type()
    }

    /// File extension matching [`mime_type`](Self::mime_type).
    pub fn extension(&self) -> &'static str {
        self.output_type.extension()
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    /// The first frame.
    pub fn image(&self) -> Option<&DynamicImage> {
        self.frames.first().map(|f| &f.image)
    }

    /// Consume the handle, keeping only the first frame.
    pub fn into_image(self) -> Option<DynamicImage> {
        self.frames.into_iter().next().map(|f| f.image)
    }

    /// EXIF captured from JPEG input, updated by [`orient`](Self::orient).
    pub fn exif(&self) -> Option<&ExifData> {
        self.exif.as_ref()
    }

    pub fn settings(&self) -> &EncodeSettings {
        &self.settings
    }

    fn ensure_valid(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ImageError::InvalidHandle)
        }
    }

    /// Run `op` over every frame through the bound backend.
    fn apply(&mut self, op: impl Fn(&DynamicImage) -> DynamicImage) {
        self.backend.transform_frames(&mut self.frames, &op);
    }

    // =========================================================================
    // Geometric transforms
    // =========================================================================

    /// Resize every frame to exactly `width`x`height`.
    pub fn scale(&mut self, width: u32, height: u32) -> Result<()> {
        self.ensure_valid()?;
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidGeometry(format!(
                "cannot scale to {width}x{height}"
            )));
        }
        if (width, height) == (self.width(), self.height()) {
            return Ok(());
        }
        self.apply(|img| img.resize_exact(width, height, FilterType::Lanczos3));
        Ok(())
    }

    /// Shrink so the longer edge is `max`, keeping the aspect ratio.
    ///
    /// Returns `Ok(false)` when the image already fits.
    pub fn scale_down(&mut self, max: u32) -> Result<bool> {
        self.ensure_valid()?;
        match scaling_dimensions(self.width(), self.height(), max) {
            Some((width, height)) => {
                self.scale(width, height)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Grow an image with an edge below `min`, keeping the aspect ratio.
    ///
    /// See [`scale_up_dimensions`] for the exact policy.
    pub fn scale_up(&mut self, min: u32) -> Result<()> {
        self.ensure_valid()?;
        let (width, height) = scale_up_dimensions(self.width(), self.height(), min);
        self.scale(width, height)
    }

    /// Resize to `dim`x`dim`, ignoring the aspect ratio. Crop first to avoid distortion.
    pub fn scale_to_square(&mut self, dim: u32) -> Result<()> {
        self.scale(dim, dim)
    }

    /// Cut out the `width`x`height` region at (`x`, `y`), then shrink to `max`.
    ///
    /// The region is clamped to the canvas; an empty region is an error.
    pub fn crop(&mut self, max: u32, x: u32, y: u32, width: u32, height: u32) -> Result<()> {
        self.ensure_valid()?;
        if max == 0 {
            return Err(ImageError::InvalidGeometry(
                "crop bound must be positive".to_string(),
            ));
        }
        let (x, y, width, height) = clamp_crop((self.width(), self.height()), x, y, width, height)
            .ok_or_else(|| {
                ImageError::InvalidGeometry(format!(
                    "crop {width}x{height} at ({x}, {y}) is outside the image"
                ))
            })?;

        // Resolve the final size before touching any frame
        let target = scaling_dimensions(width, height, max);
        if matches!(target, Some((w, h)) if w == 0 || h == 0) {
            return Err(ImageError::InvalidGeometry(format!(
                "crop {width}x{height} cannot be fitted within {max}"
            )));
        }
        match target {
            Some((target_w, target_h)) => self.apply(|img| {
                img.crop_imm(x, y, width, height)
                    .resize_exact(target_w, target_h, FilterType::Lanczos3)
            }),
            None => self.apply(|img| img.crop_imm(x, y, width, height)),
        }
        Ok(())
    }

    /// Rotate clockwise by `degrees`, which must be a multiple of 90.
    pub fn rotate(&mut self, degrees: i32) -> Result<()> {
        self.ensure_valid()?;
        let turns = quarter_turns(degrees).ok_or_else(|| {
            ImageError::InvalidGeometry(format!(
                "rotation by {degrees} degrees is not a multiple of 90"
            ))
        })?;
        match turns {
            1 => self.apply(DynamicImage::rotate90),
            2 => self.apply(DynamicImage::rotate180),
            3 => self.apply(DynamicImage::rotate270),
            _ => {}
        }
        Ok(())
    }

    /// Mirror across the vertical axis (`horizontal`), the horizontal axis
    /// (`vertical`), or both.
    pub fn flip(&mut self, horizontal: bool, vertical: bool) -> Result<()> {
        self.ensure_valid()?;
        if horizontal {
            self.apply(DynamicImage::fliph);
        }
        if vertical {
            self.apply(DynamicImage::flipv);
        }
        Ok(())
    }

    /// Turn the pixels upright according to their orientation metadata.
    ///
    /// JPEG input uses its EXIF Orientation tag, read from `exif_source` when
    /// given and from the original bytes otherwise. The tag is reset to
    /// top-left and the EXIF fields are returned so callers can inspect them
    /// (e.g. to strip location data). Other formats use the orientation their
    /// decoder reported, and return `None`.
    pub fn orient(&mut self, exif_source: Option<&Path>) -> Result<Option<ExifData>> {
        self.ensure_valid()?;

        if self.origin_type == ImageType::Jpeg {
            let exif = match exif_source {
                Some(path) => orientation::read_exif_file(path)?,
                None => self.exif.clone(),
            };
            let Some(mut exif) = exif else {
                return Ok(None);
            };
            if let Some(value) = exif.orientation() {
                if value != TOP_LEFT {
                    debug!(orientation = value, "Applying EXIF orientation");
                    self.apply(|img| orientation::apply_orientation(img, value));
                }
                exif.set_orientation(TOP_LEFT);
            }
            // The decoder reports the same tag; it is consumed now.
            self.native_orientation = Orientation::NoTransforms;
            self.exif = Some(exif.clone());
            return Ok(Some(exif));
        }

        let value = self.native_orientation.to_exif();
        if value != TOP_LEFT {
            debug!(orientation = value, "Applying native orientation");
            self.apply(|img| orientation::apply_orientation(img, value));
        }
        self.native_orientation = Orientation::NoTransforms;
        Ok(None)
    }

    /// Drop animation: GIF output becomes single-frame PNG. Other outputs are untouched.
    pub fn to_static(&mut self) -> Result<()> {
        self.ensure_valid()?;
        if self.output_type == ImageType::Gif {
            debug!(frames = self.frames.len(), "Converting GIF output to static PNG");
            self.output_type = ImageType::Png;
            self.frames.truncate(1);
        }
        Ok(())
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Encode the frames as [`output_type`](Self::output_type).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.ensure_valid()?;
        let quality = self.settings.quality_for(self.output_type);
        self.backend
            .encode(&self.frames, self.output_type, quality)
            .map_err(encode_error)
    }

    /// Blur-hash of the first frame, or `None` for an invalid handle.
    pub fn blur_hash(&self) -> Option<String> {
        let image = self.image()?.clone();
        super::blurhash::hash_handle(ImageHandle::from_image(
            image,
            self.output_type,
            &self.settings.without_animation(),
        ))
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("origin_type", &self.origin_type)
            .field("output_type", &self.output_type)
            .field("backend", &self.backend.kind())
            .field("width", &self.width())
            .field("height", &self.height())
            .field("frames", &self.frames.len())
            .field("failure", &self.failure)
            .finish()
    }
}
