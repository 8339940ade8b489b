//! Image processing: decode an upload, normalize it, re-encode it.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Format resolution** | `image::guess_format` + declared MIME + extension |
//! | **Decode (animated)** | `image` GIF/WebP/APNG animation decoders, coalesced |
//! | **Decode (still)** | `image::ImageReader` |
//! | **EXIF** | `kamadak-exif` |
//! | **Resize** | Lanczos3 |
//! | **Blur-hash** | `blurhash`, 9x9 components on a ≤90px copy |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Encoder settings bound at construction
//! - **Sniffing**: Format resolution and animation detection on raw bytes
//! - **Backends**: [`ImageBackend`] trait + [`AnimatedBackend`] and [`RasterBackend`]
//! - **Handle**: [`ImageHandle`], the one type callers work with

pub mod animated_backend;
pub mod backend;
pub mod blurhash;
mod calculations;
pub mod handle;
pub mod orientation;
mod params;
pub mod raster_backend;
pub mod sniff;

pub use animated_backend::AnimatedBackend;
pub use backend::{BackendError, BackendKind, Frame, ImageBackend};
pub use calculations::{scale_up_dimensions, scaling_dimensions};
pub use handle::{ImageError, ImageHandle};
pub use orientation::ExifData;
pub use params::{EncodeSettings, Quality};
pub use raster_backend::RasterBackend;
