//! Sort runs
//!
//! A run is planned first and executed afterwards. Planning only reads the
//! input directories; the caller shows the plan, asks for confirmation and
//! then hands it back to [`Sorter::execute`].

use crate::config::{Config, DispositionMode, MetadataBackend};
use crate::disposition::{self, DispositionOptions, DispositionReport};
use crate::error::{Error, Result};
use crate::index::build_index;
use crate::naming::{folder_path, get_rename_list};
use crate::plan::{RenamePlan, get_preview, get_summary};
use crate::time::{ExifReader, ExifToolReader, MetadataReader};
use crate::transcode::{HandBrake, TranscodeReport, Transcoder, transcode_videos};
use std::fmt;
use std::io::{BufRead, Write};
use std::path::{self, Path, PathBuf};
use tracing::{Level, info, span, warn};

/// A planned run, nothing has been changed yet
#[derive(Debug, Clone)]
pub struct SortPlan {
    pub mode: DispositionMode,
    pub input_dirs: Vec<PathBuf>,
    /// Folder receiving every file, it does not exist yet
    pub output_folder: PathBuf,
    pub plan: RenamePlan,
}

impl SortPlan {
    pub fn summary(&self) -> String {
        get_summary(
            &self.plan,
            self.mode,
            &self.input_dirs,
            Some(&self.output_folder),
        )
    }

    pub fn preview(&self) -> String {
        get_preview(&self.plan)
    }
}

/// Everything an executed run did
#[derive(Debug)]
pub struct RunReport {
    pub disposition: DispositionReport,
    pub transcode: Option<TranscodeReport>,
    /// Input directories removed after a replace
    pub removed_dirs: Vec<PathBuf>,
    /// Input directory that could not be removed after a replace
    pub cleanup_error: Option<Error>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        !self.disposition.has_failures()
            && self.disposition.history_error.is_none()
            && self.transcode.as_ref().is_none_or(|t| t.failed.is_empty())
            && self.cleanup_error.is_none()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.disposition)?;
        if let Some(transcode) = &self.transcode {
            write!(f, "\n{}", transcode)?;
        }
        for dir in &self.removed_dirs {
            if self.disposition.dry_run {
                write!(f, "\nWould remove {}", dir.display())?;
            } else {
                write!(f, "\nRemoved {}", dir.display())?;
            }
        }
        if let Some(e) = &self.cleanup_error {
            write!(f, "\n{}", e)?;
        }
        Ok(())
    }
}

/// Plans and executes sort runs for one configuration
///
/// Owns the metadata reader for the whole run; an `exiftool` process is
/// stopped when the sorter is dropped.
pub struct Sorter {
    config: Config,
    reader: Box<dyn MetadataReader>,
    transcoder: Box<dyn Transcoder>,
}

impl Sorter {
    /// Sorter with the metadata backend chosen in the config and HandBrake
    pub fn new(config: Config) -> Result<Self> {
        let reader: Box<dyn MetadataReader> = match config.metadata_backend {
            MetadataBackend::Builtin => Box::new(ExifReader::new()),
            MetadataBackend::Exiftool => Box::new(ExifToolReader::new()?),
        };
        let transcoder = Box::new(HandBrake::new(config.transcoder.clone()));
        Ok(Self::with_backends(config, reader, transcoder))
    }

    pub fn with_backends(
        config: Config,
        reader: Box<dyn MetadataReader>,
        transcoder: Box<dyn Transcoder>,
    ) -> Self {
        Self {
            config,
            reader,
            transcoder,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compute the rename plan for the configured inputs
    pub fn plan(&mut self) -> Result<SortPlan> {
        let _span = span!(Level::INFO, "plan").entered();
        let config = &self.config;
        let mode = config.disposition_mode();

        if mode == DispositionMode::Replace && config.input_dirs.len() != 1 {
            return Err(Error::ReplaceNeedsSingleInput {
                count: config.input_dirs.len(),
            });
        }

        if config.naming.is_empty() {
            warn!("No year, event, sub event or photographer given, files are only numbered");
        }

        let index = build_index(&config.input_dirs, config, self.reader.as_mut())?;
        if index.is_empty() {
            return Err(Error::NoInputFiles);
        }

        let output_root = match &config.output_dir {
            Some(dir) => dir.clone(),
            None => replace_root(&config.input_dirs[0])?,
        };
        let output_folder = folder_path(&output_root, &config.naming)?;
        let plan = get_rename_list(&config.naming, &index, Some(&output_folder));

        info!(%mode, ?output_folder, files = plan.len(), "Planned sort");

        Ok(SortPlan {
            mode,
            input_dirs: config.input_dirs.clone(),
            output_folder,
            plan,
        })
    }

    /// Carry out a plan
    ///
    /// Per file failures are collected in the report. With a dry run every
    /// step is reported and nothing on disk changes.
    pub fn execute(&mut self, sort_plan: &SortPlan) -> Result<RunReport> {
        let _span = span!(Level::INFO, "execute", dry_run = self.config.dry_run).entered();
        let dry_run = self.config.dry_run;

        if dry_run {
            info!(folder = ?sort_plan.output_folder, "Would create output folder");
        } else {
            disposition::create_output_folder(&sort_plan.output_folder)?;
        }

        let options = DispositionOptions {
            dry_run,
            rename_history: self.config.rename_history,
        };
        let disposition = disposition::execute(&sort_plan.plan, sort_plan.mode, options)?;

        let transcode = if self.config.encode && !dry_run {
            Some(transcode_videos(
                std::slice::from_ref(&sort_plan.output_folder),
                &self.config,
                self.transcoder.as_mut(),
                self.reader.as_mut(),
            )?)
        } else {
            None
        };

        let mut removed_dirs = Vec::new();
        let mut cleanup_error = None;
        if sort_plan.mode == DispositionMode::Replace {
            let cleanup =
                disposition::remove_emptied_dirs(&sort_plan.input_dirs, &sort_plan.plan, dry_run);
            match cleanup {
                Ok(removed) => removed_dirs = removed,
                Err(e @ Error::DestinationNotEmpty { .. }) => {
                    warn!(error = %e, "Input directory left behind");
                    cleanup_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(RunReport {
            disposition,
            transcode,
            removed_dirs,
            cleanup_error,
        })
    }
}

/// Root for the new folder when replacing `input_dir`: its parent
fn replace_root(input_dir: &Path) -> Result<PathBuf> {
    let input_dir = path::absolute(input_dir)?;
    input_dir
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::Config(format!("{} has no parent directory", input_dir.display())))
}

/// Ask a yes/no question, an empty answer means yes
pub fn confirm<R: BufRead, W: Write>(prompt: &str, input: &mut R, output: &mut W) -> Result<bool> {
    write!(output, "{} [Y/n] ", prompt)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();

    Ok(matches!(answer.as_str(), "" | "y" | "ye" | "yes" | "j"))
}
