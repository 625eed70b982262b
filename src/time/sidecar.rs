//! Sidecar metadata lookup
//!
//! MPEG videos from older cameras keep their EXIF data in a separate
//! thumbnail file with the same base name (`MVI_0042.MPG` + `MVI_0042.THM`).

use crate::config::Config;
use std::path::{Path, PathBuf};
use tracing::trace;

/// File to read embedded metadata from: the sidecar when one exists,
/// otherwise the file itself
pub fn metadata_file(path: &Path, config: &Config) -> PathBuf {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return path.to_path_buf();
    };

    if config.has_sidecar_metadata(ext) {
        for sidecar_ext in &config.sidecar_extensions {
            let candidate = path.with_extension(sidecar_ext);
            if candidate.is_file() {
                trace!(?path, ?candidate, "Using sidecar metadata file");
                return candidate;
            }
        }
    }

    path.to_path_buf()
}
