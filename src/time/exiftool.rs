//! Metadata reader backed by a persistent exiftool process

use super::MetadataReader;
use crate::error::{Error, Result};
use exiftool::ExifTool;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, trace};

/// Reads tags through one long-running `exiftool` process.
///
/// The process is started by [`ExifToolReader::new`] and terminated when the
/// reader is dropped, so a run holds it for exactly as long as it needs it.
pub struct ExifToolReader {
    exiftool: ExifTool,
}

impl ExifToolReader {
    /// Start exiftool. Fails when exiftool is not on the PATH.
    pub fn new() -> Result<Self> {
        let exiftool = ExifTool::new().map_err(|e| Error::MetadataTool(e.to_string()))?;
        debug!("Started exiftool");
        Ok(Self { exiftool })
    }
}

impl MetadataReader for ExifToolReader {
    fn get_tag(&mut self, tag: &str, path: &Path) -> Option<String> {
        let metadata: Value = match self.exiftool.read_metadata(path, &[]) {
            Ok(metadata) => metadata,
            Err(e) => {
                trace!(?path, error = %e, "exiftool could not read file");
                return None;
            }
        };

        value_to_string(metadata.get(tag)?)
    }
}

/// Convert an exiftool JSON value to its textual form
fn value_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
