//! Photo Sort - merge photo and video folders into one collection
//!
//! This library provides functionality for sorting photos and videos from
//! several cameras into a single, chronologically numbered folder:
//! - Capture time resolution from EXIF metadata, sidecar files, filenames
//!   and file system timestamps
//! - A collision-free temporal index across all input directories
//! - Folder and file naming from year, event, sub event and photographer
//! - Copy, move or in-place replace with dry run previews
//! - Video transcoding with HandBrake

pub mod cli;
pub mod config;
pub mod disposition;
pub mod error;
pub mod index;
pub mod naming;
pub mod plan;
pub mod sorter;
pub mod time;
pub mod transcode;

pub use cli::Cli;
pub use config::{
    Config, ConfigError, DispositionMode, FileOperation, MetadataBackend, NamingContext,
};
pub use error::{Error, Result};
pub use plan::{RenameEntry, RenamePlan};
pub use sorter::{RunReport, SortPlan, Sorter, confirm};
pub use time::MetadataReader;
pub use transcode::Transcoder;
