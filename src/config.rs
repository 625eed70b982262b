//! Configuration types for photo sort

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the rename history file written next to moved files
pub const RENAME_HISTORY_FILE: &str = "rename_history.json";

/// File operation requested by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
    /// Copy files to the output folder, sources are left untouched
    #[default]
    Copy,
    /// Move files to the output folder
    Move,
}

/// How the files of a run end up in their destination.
///
/// Never stored: it is derived from the configuration every run, see
/// [`Config::disposition_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionMode {
    /// Copy into a new output folder
    Copy,
    /// Move into a new output folder
    Move,
    /// Move into a new folder beside the single input directory, then
    /// remove the emptied input directory
    Replace,
}

impl DispositionMode {
    /// Whether sources are removed from their original location
    pub fn moves_files(&self) -> bool {
        matches!(self, DispositionMode::Move | DispositionMode::Replace)
    }

    /// Verb used in reports
    pub fn verb(&self) -> &'static str {
        match self {
            DispositionMode::Copy => "Copied",
            DispositionMode::Move => "Moved",
            DispositionMode::Replace => "Renamed",
        }
    }
}

impl std::fmt::Display for DispositionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispositionMode::Copy => write!(f, "copy"),
            DispositionMode::Move => write!(f, "move"),
            DispositionMode::Replace => write!(f, "replace"),
        }
    }
}

/// Which metadata reader resolves capture times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MetadataBackend {
    /// In-process EXIF parser
    #[default]
    Builtin,
    /// Persistent exiftool process (requires exiftool on PATH)
    Exiftool,
}

/// Optional descriptive fields used in folder and file names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingContext {
    pub year: Option<String>,
    pub event: Option<String>,
    pub sub_event: Option<String>,
    pub photographer: Option<String>,
}

impl NamingContext {
    /// True when no descriptive field is set
    pub fn is_empty(&self) -> bool {
        self.year.is_none()
            && self.event.is_none()
            && self.sub_event.is_none()
            && self.photographer.is_none()
    }
}

/// External transcoder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscoderConfig {
    /// Transcoder executable
    pub program: String,
    /// Preset passed to the transcoder
    pub preset: String,
    /// Ask the transcoder to deinterlace
    pub deinterlace: bool,
    /// Copy embedded metadata from the original to the transcoded file
    pub copy_metadata: bool,
    /// Executable used to copy metadata
    pub metadata_program: String,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            program: "HandBrakeCLI".into(),
            preset: "Normal".into(),
            deinterlace: false,
            copy_metadata: true,
            metadata_program: "exiftool".into(),
        }
    }
}

/// Configuration for one photo sort run
///
/// Fields missing from a config file take their [`Default`] values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input directories, processed in this order
    pub input_dirs: Vec<PathBuf>,

    /// Root in which the output folder is created. When absent the run
    /// replaces the single input directory.
    pub output_dir: Option<PathBuf>,

    /// Descriptive naming fields
    pub naming: NamingContext,

    /// File operation when an output directory is given
    pub operation: FileOperation,

    /// Dry run mode - compute and report the plan without touching files
    pub dry_run: bool,

    /// Ask for confirmation before changing anything
    pub confirm: bool,

    /// Transcode videos after the files are in place
    pub encode: bool,

    /// Write a rename history file after moving
    pub rename_history: bool,

    /// Metadata reader used for capture times and video rotation
    pub metadata_backend: MetadataBackend,

    /// Extensions never picked up from input directories
    pub ignored_extensions: Vec<String>,

    /// Video extensions whose metadata may live in a sidecar file
    pub sidecar_video_extensions: Vec<String>,

    /// Sidecar extensions, tried in order
    pub sidecar_extensions: Vec<String>,

    /// Extensions handed to the transcoder
    pub video_extensions: Vec<String>,

    /// Transcoder settings
    pub transcoder: TranscoderConfig,

    /// Verbose output
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dirs: vec![],
            output_dir: None,
            naming: NamingContext::default(),
            operation: FileOperation::default(),
            dry_run: false,
            confirm: true,
            encode: true,
            rename_history: false,
            metadata_backend: MetadataBackend::default(),
            ignored_extensions: vec!["thm".into(), "db".into(), "info".into()],
            sidecar_video_extensions: vec!["mpg".into(), "mpeg".into()],
            sidecar_extensions: vec!["thm".into(), "THM".into()],
            video_extensions: vec![
                "avi".into(), "dv".into(), "mpg".into(), "mpeg".into(),
                "ogm".into(), "m4v".into(), "mp4".into(), "mkv".into(),
                "mov".into(), "qt".into(), "wmv".into(),
            ],
            transcoder: TranscoderConfig::default(),
            verbose: false,
        }
    }
}

impl Config {
    /// Disposition mode for this run
    ///
    /// Without an output directory the run always replaces in place, which
    /// implies moving.
    pub fn disposition_mode(&self) -> DispositionMode {
        match (&self.output_dir, self.operation) {
            (None, _) => DispositionMode::Replace,
            (Some(_), FileOperation::Copy) => DispositionMode::Copy,
            (Some(_), FileOperation::Move) => DispositionMode::Move,
        }
    }

    /// Check if a file extension is ignored when scanning input directories
    pub fn is_ignored(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.ignored_extensions
            .iter()
            .any(|e| e.to_lowercase() == ext_lower)
    }

    /// Check if a file extension may carry its metadata in a sidecar
    pub fn has_sidecar_metadata(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.sidecar_video_extensions
            .iter()
            .any(|e| e.to_lowercase() == ext_lower)
    }

    /// Check if a file extension is a video the transcoder should handle
    pub fn is_video(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.video_extensions
            .iter()
            .any(|e| e.to_lowercase() == ext_lower)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            source: e,
        })?;

        fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# Photo Sort Configuration File
# This file uses TOML format (https://toml.io)

# Folders with photos to process, in priority order.
# Files with the same capture time keep this order.
input_dirs = [
    "D:/Import/Canon",
    "D:/Import/Samsung",
]

# Folder in which the new event folder is created.
# Leave out to rename in place: the files of the single input folder are
# moved to a new folder next to it and the emptied input folder is removed.
output_dir = "D:/My Photos"

# "copy" or "move" (only used together with output_dir)
operation = "copy"

# Make no changes, only show what would happen
dry_run = false

# Ask before changing anything
confirm = true

# Transcode videos after sorting
encode = true

# Write rename_history.json into the output folder after moving
rename_history = false

# "builtin" (EXIF parser) or "exiftool" (requires exiftool on PATH)
metadata_backend = "builtin"

# Never picked up from input folders
ignored_extensions = ["thm", "db", "info"]

# MPEG videos sometimes keep their EXIF data in a .thm sidecar
sidecar_video_extensions = ["mpg", "mpeg"]
sidecar_extensions = ["thm", "THM"]

video_extensions = ["avi", "dv", "mpg", "mpeg", "ogm", "m4v", "mp4", "mkv", "mov", "qt", "wmv"]

verbose = false

[naming]
year = "2014"
event = "Boom"
# sub_event = "Beach"
photographer = "Marcus"

[transcoder]
program = "HandBrakeCLI"
preset = "Normal"
deinterlace = false
copy_metadata = true
metadata_program = "exiftool"
"#
        .to_string()
    }
}

/// Errors that can occur when loading or saving configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to write configuration file
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to serialize configuration
    SerializeError {
        source: toml::ser::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::ParseError { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), source)
            }
            ConfigError::WriteError { path, source } => {
                write!(f, "Failed to write config file '{}': {}", path.display(), source)
            }
            ConfigError::SerializeError { source } => {
                write!(f, "Failed to serialize config: {}", source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::WriteError { source, .. } => Some(source),
            ConfigError::SerializeError { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_mode_is_derived() {
        let mut config = Config::default();
        assert_eq!(config.disposition_mode(), DispositionMode::Replace);

        config.operation = FileOperation::Move;
        assert_eq!(config.disposition_mode(), DispositionMode::Replace);

        config.output_dir = Some(PathBuf::from("out"));
        assert_eq!(config.disposition_mode(), DispositionMode::Move);

        config.operation = FileOperation::Copy;
        assert_eq!(config.disposition_mode(), DispositionMode::Copy);
    }

    #[test]
    fn test_extension_checks_ignore_case() {
        let config = Config::default();
        assert!(config.is_ignored("THM"));
        assert!(config.is_ignored("db"));
        assert!(!config.is_ignored("jpg"));
        assert!(config.has_sidecar_metadata("MPG"));
        assert!(!config.has_sidecar_metadata("mp4"));
        assert!(config.is_video("MOV"));
        assert!(!config.is_video("jpg"));
    }

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(&Config::sample_config()).unwrap();
        assert_eq!(config.input_dirs.len(), 2);
        assert_eq!(config.naming.event.as_deref(), Some("Boom"));
        assert_eq!(config.naming.sub_event, None);
        assert_eq!(config.transcoder.preset, "Normal");
        assert_eq!(config.disposition_mode(), DispositionMode::Copy);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sort.toml");

        let mut config = Config::default();
        config.input_dirs = vec![PathBuf::from("a"), PathBuf::from("b")];
        config.naming.year = Some("2014".into());
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.input_dirs, config.input_dirs);
        assert_eq!(loaded.naming, config.naming);
        assert!(loaded.output_dir.is_none());
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = Config::load_from_file("/nonexistent/photo-sort.toml").unwrap_err();
        assert!(err.to_string().contains("photo-sort.toml"));
    }
}
