//! Error types for photo sort

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for photo sort operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for photo sort
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No files to process")]
    NoInputFiles,

    #[error("Photo sort aborted")]
    Aborted,

    #[error(
        "Directory {} is not empty after moving its files; \
         remove or move the remaining entries manually",
        path.display()
    )]
    DestinationNotEmpty { path: PathBuf },

    #[error("Can not replace in place with {count} input directories, exactly one is required")]
    ReplaceNeedsSingleInput { count: usize },

    #[error("Failed to create output folder {}: {source}", path.display())]
    CreateOutputFolder {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to process {} -> {}: {message}", from.display(), to.display())]
    Disposition {
        from: PathBuf,
        to: PathBuf,
        message: String,
    },

    #[error("Failed to transcode {}: {message}", path.display())]
    Transcode { path: PathBuf, message: String },

    #[error("Metadata tool error: {0}")]
    MetadataTool(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
