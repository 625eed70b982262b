//! Executes rename plans
//!
//! Copies or moves every entry of a [`RenamePlan`]. A dry run walks exactly
//! the same path and only skips the calls that touch the file system, so
//! the preview of a dry run is what a real run does.

use crate::config::{DispositionMode, RENAME_HISTORY_FILE};
use crate::error::{Error, Result};
use crate::plan::{RenameEntry, RenamePlan};
use filetime::FileTime;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info, span, warn};

/// Outcome of one plan entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    /// File was copied or moved
    Done,
    /// Dry run - would have been copied or moved
    DryRun,
    /// Operation failed, the source is left where it was
    Failed(String),
}

/// Result of processing a single entry
#[derive(Debug, Clone)]
pub struct EntryOutcome {
    pub entry: RenameEntry,
    pub status: EntryStatus,
}

/// What a disposition run did, or would have done
#[derive(Debug, Clone)]
pub struct DispositionReport {
    pub mode: DispositionMode,
    pub dry_run: bool,
    pub outcomes: Vec<EntryOutcome>,
    /// Rename history files written
    pub history_files: Vec<PathBuf>,
    /// Why the rename history could not be written
    pub history_error: Option<String>,
}

impl DispositionReport {
    /// Entries that were (or would have been) processed
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o.status, EntryStatus::Failed(_)))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&RenameEntry, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            EntryStatus::Failed(message) => Some((&o.entry, message.as_str())),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

impl fmt::Display for DispositionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = self.mode.verb();
        if self.dry_run {
            write!(
                f,
                "[DRY RUN] Would have {} {} files.",
                verb.to_lowercase(),
                self.succeeded()
            )?;
        } else {
            write!(f, "{} {} files.", verb, self.succeeded())?;
        }

        for (entry, message) in self.failures() {
            write!(
                f,
                "\n  Failed: {} -> {}: {}",
                entry.source().display(),
                entry.destination().display(),
                message
            )?;
        }

        for history in &self.history_files {
            write!(f, "\nRename history written to {}", history.display())?;
        }

        if let Some(e) = &self.history_error {
            write!(f, "\nRename history not written: {}", e)?;
        }

        Ok(())
    }
}

/// Flags that change how a plan is executed
#[derive(Debug, Clone, Copy, Default)]
pub struct DispositionOptions {
    pub dry_run: bool,
    /// Write the applied renames next to the moved files
    pub rename_history: bool,
}

/// Create the output folder; an existing folder is fine
pub fn create_output_folder(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| Error::CreateOutputFolder {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(?path, "Output folder ready");
    Ok(())
}

/// Copy or move every entry of the plan
///
/// A failing entry is recorded in the report and the remaining entries are
/// still processed.
pub fn execute(
    plan: &RenamePlan,
    mode: DispositionMode,
    options: DispositionOptions,
) -> Result<DispositionReport> {
    let _span = span!(Level::INFO, "disposition", %mode, dry_run = options.dry_run).entered();

    let mut outcomes = Vec::with_capacity(plan.len());

    for entry in plan.entries() {
        let (source, destination) = (entry.source(), entry.destination());
        let status = if options.dry_run {
            match check_destination(source, destination) {
                Ok(_) => {
                    info!(?source, ?destination, "Would {} file", mode);
                    EntryStatus::DryRun
                }
                Err(e) => {
                    warn!(?source, ?destination, error = %e, "File would fail");
                    EntryStatus::Failed(e.to_string())
                }
            }
        } else {
            match perform_file_operation(source, destination, mode) {
                Ok(()) => {
                    debug!(?source, ?destination, "Processed file");
                    EntryStatus::Done
                }
                Err(e) => {
                    error!(?source, ?destination, error = %e, "Failed to process file");
                    EntryStatus::Failed(e.to_string())
                }
            }
        };

        outcomes.push(EntryOutcome {
            entry: entry.clone(),
            status,
        });
    }

    let mut report = DispositionReport {
        mode,
        dry_run: options.dry_run,
        outcomes,
        history_files: Vec::new(),
        history_error: None,
    };

    if options.rename_history && mode.moves_files() {
        if report.has_failures() {
            warn!("Not writing rename history, some files failed");
        } else if options.dry_run {
            info!("Would write rename history");
        } else {
            for dir in plan.destination_dirs() {
                let entries: Vec<&RenameEntry> = plan
                    .entries()
                    .iter()
                    .filter(|e| e.destination().parent() == Some(dir.as_path()))
                    .collect();
                match write_rename_history(&dir, &entries) {
                    Ok(path) => report.history_files.push(path),
                    Err(e) => {
                        error!(?dir, error = %e, "Failed to write rename history");
                        report.history_error = Some(e.to_string());
                        break;
                    }
                }
            }
        }
    }

    info!(
        succeeded = report.succeeded(),
        failed = report.outcomes.len() - report.succeeded(),
        "Disposition finished"
    );

    Ok(report)
}

/// Write `rename_history.json` into `dir`
///
/// The history is serialized before the file is created, so a path that
/// JSON can not hold leaves no file behind.
pub fn write_rename_history(dir: &Path, entries: &[&RenameEntry]) -> Result<PathBuf> {
    let json = serde_json::to_vec_pretty(entries)?;
    let path = dir.join(RENAME_HISTORY_FILE);
    fs::write(&path, json)?;

    info!(?path, count = entries.len(), "Wrote rename history");
    Ok(path)
}

/// Remove input directories emptied by a move
///
/// A directory that still holds entries (files that were ignored, or whose
/// move failed) is an error naming that directory. In a dry run the files of
/// the plan count as gone and nothing is removed.
pub fn remove_emptied_dirs(
    dirs: &[PathBuf],
    plan: &RenamePlan,
    dry_run: bool,
) -> Result<Vec<PathBuf>> {
    let planned: HashSet<&Path> = plan.entries().iter().map(|e| e.source()).collect();
    let mut removed = Vec::new();

    for dir in dirs {
        if !dir.exists() {
            debug!(?dir, "Directory already gone");
            continue;
        }

        let mut remaining = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if dry_run && planned.contains(path.as_path()) {
                continue;
            }
            remaining.push(path);
        }

        if !remaining.is_empty() {
            warn!(?dir, ?remaining, "Directory is not empty");
            return Err(Error::DestinationNotEmpty { path: dir.clone() });
        }

        if dry_run {
            info!(?dir, "Would remove emptied directory");
        } else {
            fs::remove_dir(dir)?;
            info!(?dir, "Removed emptied directory");
        }
        removed.push(dir.clone());
    }

    Ok(removed)
}

/// Check that `dest` can be written without clobbering anything
///
/// Returns `false` when source and destination are the same file and there
/// is nothing to do.
fn check_destination(source: &Path, dest: &Path) -> Result<bool> {
    if source == dest {
        return Ok(false);
    }

    if dest.exists() {
        return Err(Error::Disposition {
            from: source.to_path_buf(),
            to: dest.to_path_buf(),
            message: "destination already exists".into(),
        });
    }

    Ok(true)
}

/// Perform the actual file operation
fn perform_file_operation(source: &Path, dest: &Path, mode: DispositionMode) -> Result<()> {
    if !check_destination(source, dest)? {
        return Ok(());
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    match mode {
        DispositionMode::Copy => {
            copy_file(source, dest)?;
        }
        DispositionMode::Move | DispositionMode::Replace => {
            // Try rename first (faster for same filesystem)
            if fs::rename(source, dest).is_err() {
                // Fall back to copy + delete for cross-filesystem moves
                copy_file(source, dest)?;
                fs::remove_file(source)?;
            }
        }
    }

    Ok(())
}

/// Copy file contents and permissions, then carry over access and
/// modification times
fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    fs::copy(source, dest)?;

    let metadata = fs::metadata(source)?;
    let atime = FileTime::from_last_access_time(&metadata);
    let mtime = FileTime::from_last_modification_time(&metadata);
    if let Err(e) = filetime::set_file_times(dest, atime, mtime) {
        warn!(?dest, error = %e, "Could not preserve file times");
    }

    Ok(())
}
