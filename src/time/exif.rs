//! In-process EXIF reader for images and sidecar files

use super::MetadataReader;
use chrono::NaiveDateTime;
use exif::{In, Reader, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::trace;

/// EXIF date format: "YYYY:MM:DD HH:MM:SS"
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Metadata reader backed by the `kamadak-exif` parser
///
/// Only EXIF containers (JPEG, TIFF, HEIF, PNG, WebP and the `.thm`
/// thumbnails of MPEG videos) are understood. Video container tags such as
/// `Rotation` are never found by this reader.
#[derive(Debug, Default)]
pub struct ExifReader;

impl ExifReader {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataReader for ExifReader {
    fn get_tag(&mut self, tag: &str, path: &Path) -> Option<String> {
        let file = File::open(path).ok()?;
        let mut reader = BufReader::new(file);

        let exif = match Reader::new().read_from_container(&mut reader) {
            Ok(exif) => exif,
            Err(e) => {
                trace!(?path, error = %e, "No EXIF data");
                return None;
            }
        };

        let field = exif
            .fields()
            .find(|f| f.ifd_num == In::PRIMARY && f.tag.to_string() == tag)?;

        // Ascii values are returned raw so dates keep their EXIF layout
        let value = match field.value {
            Value::Ascii(ref parts) => parts
                .first()
                .map(|p| String::from_utf8_lossy(p).trim_end_matches('\0').to_string())?,
            _ => field.display_value().to_string(),
        };

        trace!(?path, tag, %value, "Found EXIF tag");
        Some(value)
    }
}

/// Parse an EXIF datetime string: "YYYY:MM:DD HH:MM:SS"
pub fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"');
    NaiveDateTime::parse_from_str(s, EXIF_DATE_FORMAT).ok()
}
