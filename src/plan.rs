//! Rename plans and their textual preview

use crate::config::DispositionMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use unicode_width::UnicodeWidthStr;

/// One file to be copied or moved
///
/// Serialized as `{"from": ..., "to": ...}` in the rename history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameEntry {
    from: PathBuf,
    to: PathBuf,
}

impl RenameEntry {
    pub fn new(from: PathBuf, to: PathBuf) -> Self {
        Self { from, to }
    }

    pub fn source(&self) -> &Path {
        &self.from
    }

    pub fn destination(&self) -> &Path {
        &self.to
    }
}

/// Ordered list of files to process
///
/// The order is the capture time order; entry `n` carries position `n + 1`
/// in its destination name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamePlan {
    entries: Vec<RenameEntry>,
}

impl RenamePlan {
    pub fn new(entries: Vec<RenameEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RenameEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of files per lower-cased source extension
    pub fn extension_histogram(&self) -> BTreeMap<String, usize> {
        let mut histogram = BTreeMap::new();
        for entry in &self.entries {
            let ext = entry
                .source()
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            *histogram.entry(ext).or_insert(0) += 1;
        }
        histogram
    }

    /// Histogram as `jpg=120, mp4=4`
    pub fn histogram_line(&self) -> String {
        self.extension_histogram()
            .iter()
            .map(|(ext, count)| format!("{}={}", ext, count))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Distinct destination directories, in plan order
    pub fn destination_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for entry in &self.entries {
            if let Some(parent) = entry.destination().parent()
                && !dirs.iter().any(|d| d == parent)
            {
                dirs.push(parent.to_path_buf());
            }
        }
        dirs
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Two-column "before / after" table followed by the extension histogram
///
/// The first column is as wide as the widest original name of the whole
/// plan, measured in terminal columns, so every row lines up.
pub fn get_preview(plan: &RenamePlan) -> String {
    const BEFORE: &str = "Before";
    const AFTER: &str = "After";

    let rows: Vec<(String, String)> = plan
        .entries()
        .iter()
        .map(|e| (display_name(e.source()), display_name(e.destination())))
        .collect();

    let width = rows
        .iter()
        .map(|(before, _)| before.width())
        .chain(std::iter::once(BEFORE.width()))
        .max()
        .unwrap_or(0);
    let after_width = rows
        .iter()
        .map(|(_, after)| after.width())
        .chain(std::iter::once(AFTER.width()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "{}", pad(BEFORE, width) + "   " + AFTER);
    let _ = writeln!(out, "{}   {}", "-".repeat(width), "-".repeat(after_width));
    for (before, after) in &rows {
        let _ = writeln!(out, "{}   {}", pad(before, width), after);
    }
    let _ = writeln!(out);
    let _ = write!(out, "{}", plan.histogram_line());
    out
}

/// Left-align `s` in `width` terminal columns
fn pad(s: &str, width: usize) -> String {
    let mut padded = s.to_string();
    padded.push_str(&" ".repeat(width.saturating_sub(s.width())));
    padded
}

/// Overview shown before asking for confirmation
pub fn get_summary(
    plan: &RenamePlan,
    mode: DispositionMode,
    input_dirs: &[PathBuf],
    output_folder: Option<&Path>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Input directories:");
    for dir in input_dirs {
        let _ = writeln!(out, "  {}", dir.display());
    }
    match output_folder {
        Some(folder) => {
            let _ = writeln!(out, "Output directory: {}", folder.display());
        }
        None => {
            let _ = writeln!(out, "Output directory: (in place)");
        }
    }
    let _ = writeln!(out, "Mode: {}", mode);
    let _ = write!(out, "Files: {} ({})", plan.len(), plan.histogram_line());
    out
}
