//! # fedimage
//!
//! Image normalization for a federated social server. Every uploaded or
//! fetched image goes through one [`ImageHandle`](imaging::ImageHandle):
//! identify the format, decode it, fix its orientation, shrink or crop it,
//! re-encode it, and compute a blur-hash placeholder for it.
//!
//! ```text
//! bytes + declared mime + filename
//!   → resolve format        (content beats a wrong declaration)
//!   → decode                (animated backend when useful, raster otherwise)
//!   → orient / scale / crop / rotate / flip / to_static
//!   → to_bytes              (same format, quality from config)
//!   → blur_hash
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | The image handle, its backends, EXIF orientation and blur-hashes |
//! | [`config`] | `fedimage.toml` loading, validation and merging over stock defaults |
//! | [`types`] | [`ImageType`](types::ImageType): the supported formats and their MIME types |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Never Trust the Declared Type Blindly
//!
//! A declared MIME type naming a supported format is used as-is. Anything
//! else (empty, `application/octet-stream`, a wrong guess from a remote
//! server) is replaced by what the content's magic number says, then by the
//! filename extension. Images nobody could identify are re-encoded as WebP.
//!
//! ## Invalid Handles Instead of Errors
//!
//! Building a handle never fails. A handle that could not decode its input
//! is *invalid*: it reports zero dimensions, keeps the reason, and every
//! transform on it returns [`ImageError::InvalidHandle`](imaging::ImageError).
//! Callers that want `?` use [`ImageHandle::try_new`](imaging::ImageHandle::try_new).
//!
//! ## Frames Are Always Full Canvases
//!
//! Animated input is coalesced on decode, so every transform is a plain
//! per-frame operation and the handle never needs to know which backend it
//! is bound to.

pub mod config;
pub mod imaging;
pub mod output;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
