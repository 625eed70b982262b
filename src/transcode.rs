//! Video transcoding
//!
//! Re-encodes the videos of a sorted folder to MP4 with an external
//! transcoder and carries their embedded metadata over to the new file.

use crate::config::{Config, TranscoderConfig};
use crate::error::{Error, Result};
use crate::index::list_files;
use crate::time::{MetadataReader, ROTATION};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{Level, debug, error, info, span, warn};

/// One file to transcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// HandBrake rotation value
    pub rotation: Option<u8>,
}

/// External video transcoder
pub trait Transcoder {
    fn transcode(&mut self, job: &TranscodeJob) -> Result<()>;

    /// Copy embedded metadata and file dates from one file to another
    fn copy_metadata(&mut self, from: &Path, to: &Path) -> Result<()>;
}

/// `HandBrakeCLI` backed transcoder, metadata is copied with `exiftool`
#[derive(Debug, Clone)]
pub struct HandBrake {
    settings: TranscoderConfig,
}

impl HandBrake {
    pub fn new(settings: TranscoderConfig) -> Self {
        Self { settings }
    }

    /// Arguments for one job
    pub fn arguments(&self, job: &TranscodeJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--preset".into(),
            self.settings.preset.clone().into(),
            "-i".into(),
            job.input.clone().into(),
            "-o".into(),
            job.output.clone().into(),
        ];
        if let Some(rotation) = job.rotation {
            args.push(format!("--rotate={rotation}").into());
        }
        if self.settings.deinterlace {
            args.push("--deinterlace".into());
        }
        args
    }
}

fn run(program: &str, args: &[OsString], path: &Path) -> Result<()> {
    debug!(program, ?args, "Running external program");
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Error::Transcode {
            path: path.to_path_buf(),
            message: format!("failed to start {program}: {e}"),
        })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
    Err(Error::Transcode {
        path: path.to_path_buf(),
        message: format!("{program} exited with {}: {}", output.status, last_line.trim()),
    })
}

impl Transcoder for HandBrake {
    fn transcode(&mut self, job: &TranscodeJob) -> Result<()> {
        run(&self.settings.program, &self.arguments(job), &job.input)
    }

    fn copy_metadata(&mut self, from: &Path, to: &Path) -> Result<()> {
        let args: Vec<OsString> = vec![
            "-quiet".into(),
            "-preserve".into(),
            "-overwrite_original".into(),
            "-TagsFromFile".into(),
            from.into(),
            to.into(),
        ];
        run(&self.settings.metadata_program, &args, to)
    }
}

/// Map a rotation in degrees to the value HandBrake expects
pub fn handbrake_rotation(degrees: &str) -> Option<u8> {
    let degrees = degrees.trim().parse::<f64>().ok()?;
    match degrees as i64 {
        90 => Some(4),
        180 => Some(3),
        270 => Some(7),
        _ => None,
    }
}

/// Outcome of a transcoding pass
#[derive(Debug, Default)]
pub struct TranscodeReport {
    /// Original file and the MP4 that replaced it
    pub transcoded: Vec<(PathBuf, PathBuf)>,
    /// Files left untouched, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

impl TranscodeReport {
    pub fn is_empty(&self) -> bool {
        self.transcoded.is_empty() && self.failed.is_empty()
    }
}

impl fmt::Display for TranscodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transcoded {} videos.", self.transcoded.len())?;
        for (path, message) in &self.failed {
            write!(f, "\n  Failed to transcode {}: {}", path.display(), message)?;
        }
        Ok(())
    }
}

/// Transcode every video found directly inside `dirs`
///
/// A failing video is kept as it was and recorded in the report; the
/// remaining videos are still transcoded.
pub fn transcode_videos(
    dirs: &[PathBuf],
    config: &Config,
    transcoder: &mut dyn Transcoder,
    reader: &mut dyn MetadataReader,
) -> Result<TranscodeReport> {
    let _span = span!(Level::INFO, "transcode").entered();
    let mut report = TranscodeReport::default();

    for dir in dirs {
        for path in list_files(dir, config)? {
            let is_video = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| config.is_video(e));
            if !is_video {
                continue;
            }

            match transcode_file(&path, config, transcoder, reader) {
                Ok(output) => {
                    info!(input = ?path, ?output, "Transcoded video");
                    report.transcoded.push((path, output));
                }
                Err(e) => {
                    error!(?path, error = %e, "Failed to transcode video");
                    report.failed.push((path, e.to_string()));
                }
            }
        }
    }

    Ok(report)
}

fn transcode_file(
    path: &Path,
    config: &Config,
    transcoder: &mut dyn Transcoder,
    reader: &mut dyn MetadataReader,
) -> Result<PathBuf> {
    let output = path.with_extension("mp4");
    let rotation = reader
        .get_tag(ROTATION, path)
        .and_then(|r| handbrake_rotation(&r));

    // The output name is taken, usually by the input itself
    let input = if output.exists() {
        let mut name = path.as_os_str().to_os_string();
        name.push("_");
        let moved = PathBuf::from(name);
        if moved.exists() {
            return Err(Error::Transcode {
                path: path.to_path_buf(),
                message: format!("{} already exists", moved.display()),
            });
        }
        fs::rename(path, &moved)?;
        moved
    } else {
        path.to_path_buf()
    };

    let job = TranscodeJob {
        input: input.clone(),
        output: output.clone(),
        rotation,
    };

    if let Err(e) = transcoder.transcode(&job) {
        if output.exists() && output != path {
            let _ = fs::remove_file(&output);
        }
        if input != path {
            fs::rename(&input, path)?;
        }
        return Err(e);
    }

    if config.transcoder.copy_metadata {
        if let Err(e) = transcoder.copy_metadata(&input, &output) {
            warn!(?output, error = %e, "Could not copy metadata to transcoded video");
        }
    }

    fs::remove_file(&input)?;
    Ok(output)
}
