//! Folder and file naming
//!
//! Names are pure functions of the [`NamingContext`] plus a position, count
//! or serial number. The exact layout of the separators is relied upon by
//! existing collections and must not change.

use crate::config::NamingContext;
use crate::error::Result;
use crate::index::TemporalIndex;
use crate::plan::{RenameEntry, RenamePlan};
use std::path::{self, Path, PathBuf};
use tracing::debug;

/// Folder name used when no naming field is given
const FALLBACK_FOLDER_NAME: &str = "1";

/// Build an output folder name
///
/// `"{year} - {event}"`, or whichever of the two is given. A serial is
/// appended before the photographer: `"2014 - Boom - 2 - Marcus"`.
/// A photographer alone names the folder without a leading dash (`"Marcus"`).
pub fn folder_name(
    year: Option<&str>,
    event: Option<&str>,
    photographer: Option<&str>,
    serial: Option<u32>,
) -> String {
    let mut name = match (year, event) {
        (Some(year), Some(event)) => format!("{} - {}", year, event),
        (Some(year), None) => year.to_string(),
        (None, Some(event)) => event.to_string(),
        (None, None) => String::new(),
    };

    if let Some(serial) = serial {
        if name.is_empty() {
            name = serial.to_string();
        } else {
            name.push_str(&format!(" - {}", serial));
        }
    }

    if let Some(photographer) = photographer {
        if name.is_empty() {
            name.push_str(photographer);
        } else {
            name.push_str(&format!(" - {}", photographer));
        }
    }

    name
}

/// Absolute path of a new output folder below `output_root` that does not
/// exist yet
///
/// Only probes the file system, the folder is not created. The sub event is
/// part of the file names only.
pub fn folder_path(output_root: &Path, context: &NamingContext) -> Result<PathBuf> {
    let root = path::absolute(output_root)?;

    // Without year, event and photographer the serial alone names the folder
    let name_for = |serial: Option<u32>| {
        let name = folder_name(
            context.year.as_deref(),
            context.event.as_deref(),
            context.photographer.as_deref(),
            serial,
        );
        if name.is_empty() {
            FALLBACK_FOLDER_NAME.to_string()
        } else {
            name
        }
    };

    let mut folder = root.join(name_for(None));
    let mut serial = 1;

    while folder.is_dir() {
        serial += 1;
        folder = root.join(name_for(Some(serial)));
    }

    debug!(?folder, "Output folder");
    Ok(folder)
}

/// Zero padding applied to file positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexMask {
    width: usize,
}

impl IndexMask {
    /// Padding width, 0 for none
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn format(&self, position: usize) -> String {
        format!("{:0width$}", position, width = self.width)
    }
}

/// Padding for a collection of `file_count` files
///
/// Small sets get no leading zeros; from ten files on every position is
/// padded to the digit count of the total so names sort numerically.
pub fn get_index_mask(file_count: usize) -> IndexMask {
    let width = if file_count < 10 {
        0
    } else {
        file_count.to_string().len()
    };
    IndexMask { width }
}

/// Output file name for the file at zero-based `index`
///
/// `"{n} - {sub_event} - {event} {year} - {photographer}.{ext}"` with absent
/// fields left out. The year follows the event with a space, or with a dash
/// when it is the first descriptive field.
pub fn get_output_file_name(
    context: &NamingContext,
    index_mask: IndexMask,
    index: usize,
    input_file: &Path,
) -> String {
    let mut name = index_mask.format(index + 1);
    let mut described = false;

    if let Some(sub_event) = &context.sub_event {
        name.push_str(&format!(" - {}", sub_event));
        described = true;
    }

    if let Some(event) = &context.event {
        name.push_str(&format!(" - {}", event));
        described = true;
    }

    if let Some(year) = &context.year {
        if described {
            name.push_str(&format!(" {}", year));
        } else {
            name.push_str(&format!(" - {}", year));
        }
    }

    if let Some(photographer) = &context.photographer {
        name.push_str(&format!(" - {}", photographer));
    }

    if let Some(ext) = input_file.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy().to_lowercase());
    }

    name
}

/// Turn the temporal index into a rename plan
///
/// Without an output folder every file keeps its own directory and is only
/// renamed.
pub fn get_rename_list(
    context: &NamingContext,
    index: &TemporalIndex,
    output_folder: Option<&Path>,
) -> RenamePlan {
    let mask = get_index_mask(index.len());

    let entries = index
        .files()
        .enumerate()
        .map(|(position, file)| {
            let name = get_output_file_name(context, mask, position, file.path());
            let folder = match output_folder {
                Some(folder) => folder.to_path_buf(),
                None => file
                    .path()
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
            };
            RenameEntry::new(file.path().to_path_buf(), folder.join(name))
        })
        .collect();

    RenamePlan::new(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MediaFile;
    use std::fs;

    fn context(
        year: Option<&str>,
        event: Option<&str>,
        sub_event: Option<&str>,
        photographer: Option<&str>,
    ) -> NamingContext {
        NamingContext {
            year: year.map(String::from),
            event: event.map(String::from),
            sub_event: sub_event.map(String::from),
            photographer: photographer.map(String::from),
        }
    }

    #[test]
    fn test_folder_name() {
        assert_eq!(folder_name(Some("2014"), Some("Boom"), None, None), "2014 - Boom");
        assert_eq!(
            folder_name(Some("2014"), Some("Boom"), Some("Marcus"), None),
            "2014 - Boom - Marcus"
        );
        assert_eq!(
            folder_name(Some("2014"), Some("Boom"), Some("Marcus"), Some(2)),
            "2014 - Boom - 2 - Marcus"
        );
    }

    #[test]
    fn test_folder_name_partial_fields() {
        assert_eq!(folder_name(Some("2014"), None, None, None), "2014");
        assert_eq!(folder_name(None, Some("Boom"), None, None), "Boom");
        assert_eq!(folder_name(None, None, None, None), "");
        assert_eq!(folder_name(None, None, None, Some(3)), "3");
        assert_eq!(folder_name(None, Some("Boom"), None, Some(2)), "Boom - 2");
        assert_eq!(folder_name(None, None, Some("Marcus"), None), "Marcus");
    }

    #[test]
    fn test_folder_path() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(Some("2014"), Some("Boom"), None, None);

        let result = folder_path(dir.path(), &ctx).unwrap();
        assert_eq!(result, dir.path().join("2014 - Boom"));
        // Probing does not create anything
        let again = folder_path(dir.path(), &ctx).unwrap();
        assert_eq!(again, dir.path().join("2014 - Boom"));

        fs::create_dir(&result).unwrap();
        let result = folder_path(dir.path(), &ctx).unwrap();
        assert_eq!(result, dir.path().join("2014 - Boom - 2"));
    }

    #[test]
    fn test_folder_path_with_photographer() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(Some("2014"), Some("Boom"), Some("Beach"), Some("Marcus"));

        let result = folder_path(dir.path(), &ctx).unwrap();
        assert_eq!(result, dir.path().join("2014 - Boom - Marcus"));

        fs::create_dir(&result).unwrap();
        fs::create_dir(dir.path().join("2014 - Boom - 2 - Marcus")).unwrap();
        let result = folder_path(dir.path(), &ctx).unwrap();
        assert_eq!(result, dir.path().join("2014 - Boom - 3 - Marcus"));
    }

    #[test]
    fn test_folder_path_without_fields() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = NamingContext::default();

        assert_eq!(folder_path(dir.path(), &ctx).unwrap(), dir.path().join("1"));
        fs::create_dir(dir.path().join("1")).unwrap();
        assert_eq!(folder_path(dir.path(), &ctx).unwrap(), dir.path().join("2"));

        let sub_event_only = context(None, None, Some("Beach"), None);
        assert_eq!(
            folder_path(dir.path(), &sub_event_only).unwrap(),
            dir.path().join("2")
        );
    }

    #[test]
    fn test_folder_path_is_absolute() {
        let result = folder_path(Path::new("relative/root"), &NamingContext::default()).unwrap();
        assert!(result.is_absolute());
        assert!(result.ends_with("relative/root/1"));
    }

    #[test]
    fn test_index_mask() {
        assert_eq!(get_index_mask(1).width(), 0);
        assert_eq!(get_index_mask(9).width(), 0);
        assert_eq!(get_index_mask(10).width(), 2);
        assert_eq!(get_index_mask(100).width(), 3);
        assert_eq!(get_index_mask(1000).width(), 4);
        assert_eq!(get_index_mask(10000).width(), 5);

        assert_eq!(get_index_mask(9).format(7), "7");
        assert_eq!(get_index_mask(10).format(7), "07");
        assert_eq!(get_index_mask(150).format(12), "012");
    }

    #[test]
    fn test_output_file_name() {
        let input_file = Path::new("/tmp/photo_sort/IMG4101.jpg");
        let mask = get_index_mask(1);

        let ctx = context(Some("2014"), Some("Boom"), None, None);
        assert_eq!(get_output_file_name(&ctx, mask, 0, input_file), "1 - Boom 2014.jpg");

        let ctx = context(Some("2014"), Some("Boom"), None, Some("Marcus"));
        assert_eq!(
            get_output_file_name(&ctx, mask, 0, input_file),
            "1 - Boom 2014 - Marcus.jpg"
        );

        let ctx = context(Some("2014"), Some("Boom"), Some("Beach"), Some("Marcus"));
        assert_eq!(
            get_output_file_name(&ctx, mask, 0, input_file),
            "1 - Beach - Boom 2014 - Marcus.jpg"
        );
    }

    #[test]
    fn test_output_file_name_year_separator() {
        let mask = get_index_mask(12);
        let input_file = Path::new("MVI_0042.MOV");

        let ctx = context(Some("2014"), None, None, None);
        assert_eq!(get_output_file_name(&ctx, mask, 2, input_file), "03 - 2014.mov");

        let ctx = context(Some("2014"), None, Some("Beach"), None);
        assert_eq!(get_output_file_name(&ctx, mask, 2, input_file), "03 - Beach 2014.mov");

        let ctx = context(None, None, None, Some("Marcus"));
        assert_eq!(get_output_file_name(&ctx, mask, 11, input_file), "12 - Marcus.mov");

        let ctx = NamingContext::default();
        assert_eq!(get_output_file_name(&ctx, mask, 0, Path::new("README")), "01");
    }

    #[test]
    fn test_rename_list_into_output_folder() {
        let mut index = TemporalIndex::new();
        index.insert(200, MediaFile::new("/in/b/IMG_2.JPG"));
        index.insert(100, MediaFile::new("/in/a/IMG_1.jpg"));

        let ctx = context(Some("2014"), Some("Boom"), None, None);
        let plan = get_rename_list(&ctx, &index, Some(Path::new("/out/2014 - Boom")));

        let pairs: Vec<(PathBuf, PathBuf)> = plan
            .entries()
            .iter()
            .map(|e| (e.source().to_path_buf(), e.destination().to_path_buf()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (
                    PathBuf::from("/in/a/IMG_1.jpg"),
                    PathBuf::from("/out/2014 - Boom/1 - Boom 2014.jpg")
                ),
                (
                    PathBuf::from("/in/b/IMG_2.JPG"),
                    PathBuf::from("/out/2014 - Boom/2 - Boom 2014.jpg")
                ),
            ]
        );
    }

    #[test]
    fn test_rename_list_in_place() {
        let mut index = TemporalIndex::new();
        index.insert(100, MediaFile::new("/in/a/IMG_1.jpg"));
        index.insert(100, MediaFile::new("/in/b/IMG_2.jpg"));

        let ctx = context(None, Some("Boom"), None, None);
        let plan = get_rename_list(&ctx, &index, None);

        let destinations: Vec<&Path> = plan.entries().iter().map(|e| e.destination()).collect();
        assert_eq!(
            destinations,
            vec![Path::new("/in/a/1 - Boom.jpg"), Path::new("/in/b/2 - Boom.jpg")]
        );
    }
}
