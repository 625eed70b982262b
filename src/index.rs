//! Collision-free temporal index
//!
//! Collects the files of all input directories into one ordering keyed by
//! resolved time. Two files never share a key: a later file whose time is
//! taken is pushed forward one second at a time until a free slot is found,
//! so the first file seen keeps the earlier slot.

use crate::config::{Config, RENAME_HISTORY_FILE};
use crate::error::Result;
use crate::time::{MetadataReader, resolve_time};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, info, span, warn};
use walkdir::WalkDir;

/// One input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    path: PathBuf,
    extension: String,
}

impl MediaFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        Self { path, extension }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lower-cased extension without the dot, empty when there is none
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn file_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default()
    }
}

/// Files ordered by unique resolved time
#[derive(Debug, Default)]
pub struct TemporalIndex {
    entries: BTreeMap<i64, MediaFile>,
}

impl TemporalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file and return the key it was stored under
    pub fn insert(&mut self, timestamp: i64, file: MediaFile) -> i64 {
        let mut key = timestamp;
        while self.entries.contains_key(&key) {
            key += 1;
        }

        if key != timestamp {
            debug!(path = ?file.path(), timestamp, key, "Time taken already used, moved forward");
        }

        self.entries.insert(key, file);
        key
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Files in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = (i64, &MediaFile)> {
        self.entries.iter().map(|(key, file)| (*key, file))
    }

    pub fn files(&self) -> impl Iterator<Item = &MediaFile> {
        self.entries.values()
    }
}

/// Build the temporal index from all input directories, in the given order
pub fn build_index(
    directories: &[PathBuf],
    config: &Config,
    reader: &mut dyn MetadataReader,
) -> Result<TemporalIndex> {
    let _span = span!(Level::INFO, "build_index").entered();
    let mut index = TemporalIndex::new();

    for directory in directories {
        if !directory.is_dir() {
            warn!(?directory, "Input directory does not exist, skipping");
            continue;
        }

        let files = list_files(directory, config)?;
        info!(?directory, count = files.len(), "Found files");

        for path in files {
            let resolved = resolve_time(&path, config, reader);
            index.insert(resolved.timestamp, MediaFile::new(path));
        }
    }

    Ok(index)
}

/// Files directly inside `directory`, sorted by name
///
/// Hidden files, ignored extensions and rename history files are left out.
pub fn list_files(directory: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') || name == RENAME_HISTORY_FILE {
            continue;
        }

        let path = entry.path();
        if let Some(ext) = path.extension().and_then(|e| e.to_str())
            && config.is_ignored(ext)
        {
            debug!(?path, "Ignoring file");
            continue;
        }

        files.push(path.to_path_buf());
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::DATE_TIME_ORIGINAL;
    use crate::time::tests::MockReader;
    use std::fs;

    fn names(index: &TemporalIndex) -> Vec<String> {
        index.files().map(|f| f.file_name().into_owned()).collect()
    }

    #[test]
    fn test_media_file_extension_is_lower_case() {
        let file = MediaFile::new("/photos/IMG_0001.JPG");
        assert_eq!(file.extension(), "jpg");
        assert_eq!(file.file_name(), "IMG_0001.JPG");
        assert_eq!(MediaFile::new("/photos/README").extension(), "");
    }

    #[test]
    fn test_distinct_times_keep_time_order() {
        let mut index = TemporalIndex::new();
        index.insert(300, MediaFile::new("c.jpg"));
        index.insert(100, MediaFile::new("a.jpg"));
        index.insert(200, MediaFile::new("b.jpg"));

        assert_eq!(index.len(), 3);
        assert_eq!(names(&index), vec!["a.jpg", "b.jpg", "c.jpg"]);
        let keys: Vec<i64> = index.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![100, 200, 300]);
    }

    #[test]
    fn test_collisions_move_later_files_forward() {
        let mut index = TemporalIndex::new();
        assert_eq!(index.insert(100, MediaFile::new("first.jpg")), 100);
        assert_eq!(index.insert(100, MediaFile::new("second.jpg")), 101);
        assert_eq!(index.insert(100, MediaFile::new("third.jpg")), 102);
        // Chained: 101 is taken by the second file
        assert_eq!(index.insert(101, MediaFile::new("fourth.jpg")), 103);

        assert_eq!(index.len(), 4);
        assert_eq!(
            names(&index),
            vec!["first.jpg", "second.jpg", "third.jpg", "fourth.jpg"]
        );
    }

    #[test]
    fn test_list_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "b.jpg",
            "a.JPG",
            "c.mp4",
            "c.THM",
            "Thumbs.db",
            ".hidden.jpg",
            RENAME_HISTORY_FILE,
        ] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();
        fs::write(dir.path().join("nested.jpg").join("deep.jpg"), b"").unwrap();

        let files = list_files(dir.path(), &Config::default()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.jpg", "c.mp4"]);
    }

    #[test]
    fn test_build_index_across_directories() {
        let root = tempfile::tempdir().unwrap();
        let canon = root.path().join("Canon");
        let phone = root.path().join("Phone");
        fs::create_dir(&canon).unwrap();
        fs::create_dir(&phone).unwrap();
        fs::write(canon.join("IMG_0002.jpg"), b"").unwrap();
        fs::write(canon.join("IMG_0001.jpg"), b"").unwrap();
        fs::write(phone.join("VID_20140705_100000.mp4"), b"").unwrap();

        let mut reader = MockReader::default()
            .with("IMG_0001.jpg", DATE_TIME_ORIGINAL, "2014:07:05 09:00:00")
            .with("IMG_0002.jpg", DATE_TIME_ORIGINAL, "2014:07:05 10:00:00");

        let dirs = vec![canon, root.path().join("missing"), phone];
        let index = build_index(&dirs, &Config::default(), &mut reader).unwrap();

        assert_eq!(
            names(&index),
            vec!["IMG_0001.jpg", "IMG_0002.jpg", "VID_20140705_100000.mp4"]
        );
        let keys: Vec<i64> = index.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![1_404_550_800, 1_404_554_400, 1_404_554_401]);
    }
}
