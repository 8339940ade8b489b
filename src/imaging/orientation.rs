//! EXIF metadata and orientation correction.
//!
//! Cameras store pixels in sensor order and record how to display them in the
//! EXIF Orientation tag (values 1–8). Correcting an upload means applying the
//! matching flip/rotate and then marking the tag as 1 ("top-left").
//!
//! | Tag | Meaning | Correction |
//! |---|---|---|
//! | 1 | top-left | none |
//! | 2 | top-right | flip horizontal |
//! | 3 | bottom-right | rotate 180° |
//! | 4 | bottom-left | flip vertical |
//! | 5 | left-top | rotate 90° CW, flip horizontal (transpose) |
//! | 6 | right-top | rotate 90° CW |
//! | 7 | right-bottom | rotate 270° CW, flip horizontal (transverse) |
//! | 8 | left-bottom | rotate 270° CW |

use image::DynamicImage;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::path::Path;

/// EXIF tag name of the orientation field.
pub const ORIENTATION_TAG: &str = "Orientation";

/// The orientation value meaning "already upright".
pub const TOP_LEFT: u8 = 1;

/// EXIF fields of the primary image, keyed by tag name.
///
/// Values are rendered as text; the orientation is kept as its bare number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifData {
    fields: BTreeMap<String, String>,
    location: BTreeSet<String>,
}

impl ExifData {
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.fields.get(tag).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Orientation tag, when present and within 1–8.
    pub fn orientation(&self) -> Option<u8> {
        self.get(ORIENTATION_TAG)
            .and_then(|v| v.parse::<u8>().ok())
            .filter(|o| (1..=8).contains(o))
    }

    pub fn set_orientation(&mut self, orientation: u8) {
        self.fields
            .insert(ORIENTATION_TAG.to_string(), orientation.to_string());
    }

    /// Record one field; `location` marks it as GPS data.
    pub(crate) fn insert_field(&mut self, tag: String, value: String, location: bool) {
        if location {
            self.location.insert(tag.clone());
        }
        self.fields.insert(tag, value);
    }

    /// Whether any GPS field is present.
    pub fn has_location(&self) -> bool {
        !self.location.is_empty()
    }

    /// Remove every GPS field.
    pub fn strip_location(&mut self) {
        for key in std::mem::take(&mut self.location) {
            self.fields.remove(&key);
        }
    }
}

/// Parse the EXIF block of a JPEG (or other container) held in memory.
///
/// Returns `None` when the data carries no readable EXIF.
pub fn read_exif(data: &[u8]) -> Option<ExifData> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(data))
        .ok()?;

    let mut parsed = ExifData::default();
    for field in exif.fields().filter(|f| f.ifd_num == exif::In::PRIMARY) {
        let key = field.tag.to_string();
        let value = if field.tag == exif::Tag::Orientation {
            match field.value.get_uint(0) {
                Some(v) => v.to_string(),
                None => continue,
            }
        } else {
            field.display_value().with_unit(&exif).to_string()
        };
        parsed.insert_field(key, value, field.tag.context() == exif::Context::Gps);
    }
    Some(parsed)
}

/// Parse the EXIF block of the file at `path`.
pub fn read_exif_file(path: &Path) -> std::io::Result<Option<ExifData>> {
    let data = std::fs::read(path)?;
    Ok(read_exif(&data))
}

/// Apply the correction for EXIF `orientation` to `image`.
///
/// Values outside 1–8 are treated as 1.
pub fn apply_orientation(image: &DynamicImage, orientation: u8) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image.clone(),
    }
}
