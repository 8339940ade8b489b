//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Info
//!
//! ```text
//! photo.jpg
//!     Type: image/jpeg → image/jpeg (.jpg)
//!     Size: 640x480
//!     Frames: 1 (raster backend)
//!     Blur-hash: |rF?hV%2WCj[ayj[...
//! ```
//!
//! An invalid handle prints its failure instead:
//!
//! ```text
//! notes.txt
//!     Invalid: Unsupported format: text/plain
//! ```
//!
//! ## Convert
//!
//! ```text
//! photo.jpg → small.jpg
//!     640x480 → 320x240
//!     Applied: orient, scale_down 320
//!     Written: image/jpeg, 18342 bytes
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects. The report structs also
//! serialize to JSON for `--json`.

use crate::imaging::{ExifData, ImageHandle};
use serde::Serialize;

/// Longest EXIF value shown before truncation.
const EXIF_VALUE_WIDTH: usize = 60;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

// ============================================================================
// Info
// ============================================================================

/// What `info` reports about one handle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandleSummary {
    pub source: String,
    pub valid: bool,
    pub origin_mime: String,
    pub output_mime: String,
    pub extension: String,
    pub width: u32,
    pub height: u32,
    pub frames: usize,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blurhash: Option<String>,
}

impl HandleSummary {
    pub fn from_handle(source: &str, handle: &ImageHandle) -> Self {
        Self {
            source: source.to_string(),
            valid: handle.is_valid(),
            origin_mime: handle.origin_mime_type().to_string(),
            output_mime: handle.mime_type().to_string(),
            extension: handle.extension().to_string(),
            width: handle.width(),
            height: handle.height(),
            frames: handle.frame_count(),
            backend: handle.backend_kind().name().to_string(),
            failure: handle.failure().map(|e| e.to_string()),
            blurhash: handle.blur_hash(),
        }
    }
}

pub fn format_info(summary: &HandleSummary) -> Vec<String> {
    let mut lines = vec![summary.source.clone()];
    let pad = indent(1);

    if let Some(failure) = &summary.failure {
        lines.push(format!("{pad}Invalid: {failure}"));
        return lines;
    }

    lines.push(format!(
        "{pad}Type: {} \u{2192} {} (.{})",
        summary.origin_mime, summary.output_mime, summary.extension
    ));
    lines.push(format!("{pad}Size: {}x{}", summary.width, summary.height));
    lines.push(format!(
        "{pad}Frames: {} ({} backend)",
        summary.frames, summary.backend
    ));
    if let Some(hash) = &summary.blurhash {
        lines.push(format!("{pad}Blur-hash: {hash}"));
    }
    lines
}

pub fn print_info(summary: &HandleSummary) {
    for line in format_info(summary) {
        println!("{}", line);
    }
}

/// EXIF fields, one per line. GPS fields are flagged, or left out entirely
/// with `hide_location`.
pub fn format_exif(exif: &ExifData, hide_location: bool) -> Vec<String> {
    let mut exif = exif.clone();
    if hide_location {
        exif.strip_location();
    }
    if exif.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!("{}EXIF", indent(1))];
    for (tag, value) in exif.iter() {
        lines.push(format!(
            "{}{tag}: {}",
            indent(2),
            truncate(value, EXIF_VALUE_WIDTH)
        ));
    }
    if exif.has_location() {
        lines.push(format!("{}(contains location data)", indent(2)));
    }
    lines
}

// ============================================================================
// Convert
// ============================================================================

/// What `convert` did to one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertReport {
    pub input: String,
    pub output: String,
    pub before: (u32, u32),
    pub after: (u32, u32),
    pub steps: Vec<String>,
    pub mime: String,
    pub bytes: usize,
}

pub fn format_convert(report: &ConvertReport) -> Vec<String> {
    let pad = indent(1);
    let mut lines = vec![
        format!("{} \u{2192} {}", report.input, report.output),
        format!(
            "{pad}{}x{} \u{2192} {}x{}",
            report.before.0, report.before.1, report.after.0, report.after.1
        ),
    ];
    if !report.steps.is_empty() {
        lines.push(format!("{pad}Applied: {}", report.steps.join(", ")));
    }
    lines.push(format!("{pad}Written: {}, {} bytes", report.mime, report.bytes));
    lines
}

pub fn print_convert(report: &ConvertReport) {
    for line in format_convert(report) {
        println!("{}", line);
    }
}
