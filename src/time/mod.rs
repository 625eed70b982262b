//! Time resolution module
//!
//! Determines when a photo or video was most likely taken. Every file gets a
//! time: the strategies below are tried in order and the first one that
//! produces a value wins.
//! - Embedded metadata (`DateTimeOriginal`), read from a sidecar for MPEG videos
//! - Filename pattern `YYYYMMDD_HHMMSS`
//! - File system modification time

pub mod exif;
pub mod exiftool;
pub mod filename;
pub mod sidecar;

use crate::config::Config;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use tracing::{debug, trace, warn};

pub use self::exif::ExifReader;
pub use self::exiftool::ExifToolReader;

/// Tag holding the capture time of a photo
pub const DATE_TIME_ORIGINAL: &str = "DateTimeOriginal";

/// Tag holding the rotation of a video, in degrees
pub const ROTATION: &str = "Rotation";

/// Reads a single embedded metadata tag from a file.
///
/// Implementations never fail: anything that goes wrong while reading is
/// reported as an absent tag.
pub trait MetadataReader {
    fn get_tag(&mut self, tag: &str, path: &Path) -> Option<String>;
}

/// Where a resolved time came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// Embedded metadata of the file or its sidecar
    Metadata,
    /// Parsed from the filename
    Filename,
    /// File system modification time
    FileSystem,
}

/// Resolution strategies in priority order
const STRATEGIES: &[TimeSource] = &[
    TimeSource::Metadata,
    TimeSource::Filename,
    TimeSource::FileSystem,
];

impl TimeSource {
    /// Try to resolve a timestamp (seconds since the Unix epoch, UTC)
    fn attempt(
        &self,
        path: &Path,
        config: &Config,
        reader: &mut dyn MetadataReader,
    ) -> Option<i64> {
        match self {
            TimeSource::Metadata => {
                let metadata_file = sidecar::metadata_file(path, config);
                let value = reader.get_tag(DATE_TIME_ORIGINAL, &metadata_file)?;
                let taken = exif::parse_exif_datetime(&value)?;
                Some(taken.and_utc().timestamp())
            }
            TimeSource::Filename => {
                let name = path.file_name()?.to_str()?;
                let taken = filename::parse_filename_time(name)?;
                Some(taken.and_utc().timestamp())
            }
            TimeSource::FileSystem => {
                let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
                Some(DateTime::<Utc>::from(modified).timestamp())
            }
        }
    }
}

/// Resolved capture time of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTime {
    /// Seconds since the Unix epoch, UTC
    pub timestamp: i64,
    /// Strategy that produced the timestamp
    pub source: TimeSource,
}

/// Resolve when a file was most likely taken
pub fn resolve_time(
    path: &Path,
    config: &Config,
    reader: &mut dyn MetadataReader,
) -> ResolvedTime {
    for source in STRATEGIES {
        if let Some(timestamp) = source.attempt(path, config, reader) {
            debug!(?path, ?source, timestamp, "Resolved time taken");
            return ResolvedTime {
                timestamp,
                source: *source,
            };
        }
        trace!(?path, ?source, "No time found, trying next strategy");
    }

    warn!(?path, "Could not read modification time, using the Unix epoch");
    ResolvedTime {
        timestamp: 0,
        source: TimeSource::FileSystem,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs::File;
    use std::path::PathBuf;

    /// Reader answering from a fixed table of (file name, tag) pairs
    #[derive(Default)]
    pub(crate) struct MockReader {
        pub tags: HashMap<(String, String), String>,
        pub queried: Vec<PathBuf>,
    }

    impl MockReader {
        pub(crate) fn with(mut self, file_name: &str, tag: &str, value: &str) -> Self {
            self.tags
                .insert((file_name.to_string(), tag.to_string()), value.to_string());
            self
        }
    }

    impl MetadataReader for MockReader {
        fn get_tag(&mut self, tag: &str, path: &Path) -> Option<String> {
            self.queried.push(path.to_path_buf());
            let name = path.file_name()?.to_str()?.to_string();
            self.tags.get(&(name, tag.to_string())).cloned()
        }
    }

    fn touch(path: &Path, mtime: i64) {
        File::create(path).unwrap();
        filetime::set_file_mtime(path, filetime::FileTime::from_unix_time(mtime, 0)).unwrap();
    }

    #[test]
    fn test_metadata_wins_over_filename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("IMG_20200101_000000.jpg");
        touch(&path, 1_000);

        let mut reader = MockReader::default().with(
            "IMG_20200101_000000.jpg",
            DATE_TIME_ORIGINAL,
            "2014:07:05 10:00:00",
        );
        let resolved = resolve_time(&path, &Config::default(), &mut reader);

        assert_eq!(resolved.source, TimeSource::Metadata);
        assert_eq!(resolved.timestamp, 1_404_554_400);
    }

    #[test]
    fn test_malformed_metadata_falls_back_to_filename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("VID_20140705_100000.mp4");
        touch(&path, 1_000);

        let mut reader = MockReader::default().with(
            "VID_20140705_100000.mp4",
            DATE_TIME_ORIGINAL,
            "0000:00:00 00:00:00",
        );
        let resolved = resolve_time(&path, &Config::default(), &mut reader);

        assert_eq!(resolved.source, TimeSource::Filename);
        assert_eq!(resolved.timestamp, 1_404_554_400);
    }

    #[test]
    fn test_falls_back_to_modification_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holiday.jpg");
        touch(&path, 1_234_567);

        let resolved = resolve_time(&path, &Config::default(), &mut MockReader::default());

        assert_eq!(resolved.source, TimeSource::FileSystem);
        assert_eq!(resolved.timestamp, 1_234_567);
    }

    #[test]
    fn test_mpeg_reads_metadata_from_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("MVI_0042.MPG");
        touch(&video, 1_000);
        touch(&dir.path().join("MVI_0042.THM"), 1_000);

        let mut reader = MockReader::default().with(
            "MVI_0042.THM",
            DATE_TIME_ORIGINAL,
            "2014:07:05 10:00:00",
        );
        let resolved = resolve_time(&video, &Config::default(), &mut reader);

        assert_eq!(resolved.source, TimeSource::Metadata);
        assert_eq!(resolved.timestamp, 1_404_554_400);
    }

    #[test]
    fn test_missing_file_resolves_to_epoch() {
        let resolved = resolve_time(
            Path::new("/nonexistent/photo.jpg"),
            &Config::default(),
            &mut MockReader::default(),
        );
        assert_eq!(resolved.timestamp, 0);
    }
}
