//! CLI argument parsing with clap

use crate::config::{Config, FileOperation, MetadataBackend};
use clap::Parser;
use std::path::PathBuf;

/// Photo Sort - merge photo and video folders into one collection
///
/// Collects the files of one or more input folders, orders them by the time
/// they were taken and copies or moves them into a new folder named after the
/// year and event, numbering and renaming every file on the way.
#[derive(Parser, Debug, Default)]
#[command(name = "photo-sort")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file (TOML format)
    ///
    /// When specified, settings from the config file are used as defaults.
    /// CLI arguments will override config file settings.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Write a sample configuration file to this path and exit
    #[arg(long, value_name = "PATH")]
    pub init_config: Option<PathBuf>,

    /// Input directories, merged in the given order
    #[arg(short, long, num_args = 1..)]
    pub input: Option<Vec<PathBuf>>,

    /// Directory in which the new folder is created
    ///
    /// Without it the single input directory is replaced by the new folder.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Year, used in folder and file names
    #[arg(short, long)]
    pub year: Option<String>,

    /// Event name, used in folder and file names
    #[arg(short, long)]
    pub event: Option<String>,

    /// Sub event name, used in file names only
    #[arg(short, long)]
    pub sub_event: Option<String>,

    /// Photographer, appended to folder and file names
    #[arg(short, long)]
    pub photographer: Option<String>,

    /// Do not transcode videos
    #[arg(long)]
    pub skip_encode: bool,

    /// Dry run mode - show what would be done without doing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Move files instead of copying them
    #[arg(long = "move")]
    pub move_files: bool,

    /// Write rename_history.json after moving files
    #[arg(long)]
    pub rename_history: bool,

    /// Do not ask for confirmation
    #[arg(long)]
    pub yes: bool,

    /// Read metadata with a persistent exiftool process
    #[arg(long)]
    pub exiftool: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long)]
    pub json_log: bool,
}

impl Cli {
    /// Get config file name (without extension) for log naming
    pub fn config_name(&self) -> Option<String> {
        self.config.as_ref().and_then(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
        })
    }

    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(ref inputs) = self.input {
            config.input_dirs = inputs.clone();
        }
        if let Some(ref output) = self.output {
            config.output_dir = Some(output.clone());
        }
        if let Some(ref year) = self.year {
            config.naming.year = Some(year.clone());
        }
        if let Some(ref event) = self.event {
            config.naming.event = Some(event.clone());
        }
        if let Some(ref sub_event) = self.sub_event {
            config.naming.sub_event = Some(sub_event.clone());
        }
        if let Some(ref photographer) = self.photographer {
            config.naming.photographer = Some(photographer.clone());
        }
        if self.skip_encode {
            config.encode = false;
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if self.move_files {
            config.operation = FileOperation::Move;
        }
        if self.rename_history {
            config.rename_history = true;
        }
        if self.yes {
            config.confirm = false;
        }
        if self.exiftool {
            config.metadata_backend = MetadataBackend::Exiftool;
        }
        if self.verbose {
            config.verbose = true;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}
