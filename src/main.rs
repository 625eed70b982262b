//! Photo Sort - merge photo and video folders into one collection
//!
//! A CLI tool that orders the photos and videos of several input folders by
//! the time they were taken and copies or moves them into one folder with
//! numbered, descriptive names.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use photo_sort::{Cli, Config, Error, Sorter, confirm};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// CLI Output Module
mod cli_output {
    //! Colored terminal output for the command line

    use crossterm::{
        ExecutableCommand,
        style::{Color, Print, Stylize, style},
    };
    use std::io::stdout;

    /// CLI theme colors
    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const ERROR: Color = Color::Red;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    pub fn print_separator() {
        let _ = stdout().execute(Print(&format!("{}\n", "─".repeat(60))));
    }

    pub fn print_title(title: &str) {
        let _ = stdout().execute(Print(style(title).with(CliTheme::ACCENT).bold()));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_success(msg: &str) {
        let _ = stdout().execute(Print(style("✓ ").with(CliTheme::SUCCESS).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_warning(msg: &str) {
        let _ = stdout().execute(Print(style("⚠ ").with(CliTheme::WARNING).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_error(msg: &str) {
        let _ = stdout().execute(Print(style("✗ ").with(CliTheme::ERROR).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    /// Print a block of plain text
    pub fn print_block(text: &str) {
        let _ = stdout().execute(Print(format!("{}\n", text)));
    }

    pub fn print_log_path(path: &str) {
        let _ = stdout().execute(Print(style("Log file: ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{}\n", path)));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(ref path) = cli.init_config {
        std::fs::write(path, Config::sample_config())?;
        cli_output::print_success(&format!("Sample configuration written to {}", path.display()));
        return Ok(());
    }

    // Get the executable directory for Config and Log directories
    let exe_dir = get_executable_dir()?;
    let log_path = get_log_path(&exe_dir, &cli);
    let guard = setup_logging(&cli, &log_path)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Photo Sort starting");

    let config = load_config(&cli, &exe_dir)?;
    if config.verbose {
        info!(?config, "Configuration loaded");
    }

    let code = match run(config) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => match e.downcast_ref::<Error>() {
            Some(Error::NoInputFiles) | Some(Error::Aborted) => {
                info!(reason = %e, "Nothing done");
                cli_output::print_warning(&e.to_string());
                0
            }
            _ => {
                error!(error = %e, "Photo sort failed");
                cli_output::print_error(&format!("Error: {:#}", e));
                1
            }
        },
    };

    cli_output::print_log_path(&log_path.display().to_string());
    info!(log_file = %log_path.display(), "Finished");

    // Flush the log file before exiting
    drop(guard);
    std::process::exit(code);
}

/// Plan, confirm and execute one run; returns whether every step succeeded
fn run(config: Config) -> Result<bool> {
    use cli_output::*;

    let ask = config.confirm;
    let dry_run = config.dry_run;
    let mut sorter = Sorter::new(config)?;

    let plan = sorter.plan()?;

    print_separator();
    print_block(&plan.summary());
    print_separator();
    print_block(&plan.preview());

    if ask {
        let confirmed = confirm("Continue?", &mut io::stdin().lock(), &mut io::stdout())?;
        if !confirmed {
            return Err(Error::Aborted.into());
        }
    }

    let report = sorter.execute(&plan)?;

    print_separator();
    print_title(if dry_run { "Dry run complete" } else { "Photo sort complete" });
    if report.is_success() {
        print_success(&report.to_string());
    } else {
        print_error(&report.to_string());
    }
    if dry_run {
        print_warning("Dry run: no files were changed");
    }

    Ok(report.is_success())
}

/// Get the directory where the executable is located
fn get_executable_dir() -> Result<PathBuf> {
    let exe_path = std::env::current_exe()?;
    Ok(exe_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Determine the log file path based on config file or timestamp
fn get_log_path(exe_dir: &Path, cli: &Cli) -> PathBuf {
    let log_dir = exe_dir.join("Log");
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    if let Some(config_name) = cli.config_name() {
        log_dir
            .join(&config_name)
            .join(format!("{}_{}.log", config_name, timestamp))
    } else {
        log_dir.join(format!("PhotoSort_{}.log", timestamp))
    }
}

/// Resolve config path - supports shorthand syntax
fn resolve_config_path(exe_dir: &Path, config_path: &Path) -> PathBuf {
    if config_path.exists() {
        return config_path.to_path_buf();
    }

    let with_extension = if config_path.extension().is_none() {
        config_path.with_extension("toml")
    } else {
        config_path.to_path_buf()
    };

    if with_extension.exists() {
        return with_extension;
    }

    let filename = config_path.file_name().unwrap_or(config_path.as_os_str());
    let mut in_config_dir = exe_dir.join("Config").join(filename);
    if in_config_dir.extension().is_none() {
        in_config_dir = in_config_dir.with_extension("toml");
    }

    if in_config_dir.exists() {
        return in_config_dir;
    }

    config_path.to_path_buf()
}

/// Load configuration from file or CLI arguments
fn load_config(cli: &Cli, exe_dir: &Path) -> Result<Config> {
    let config = if let Some(ref config_path) = cli.config {
        let resolved_path = resolve_config_path(exe_dir, config_path);
        info!(config_file = %resolved_path.display(), "Loading configuration from file");
        let file_config = Config::load_from_file(&resolved_path)?;
        cli.merge_with_config(file_config)
    } else {
        cli.to_config()
    };

    if config.input_dirs.is_empty() {
        anyhow::bail!("No input directories given, use --input or a config file");
    }

    if let Some(ref output_dir) = config.output_dir {
        for input_dir in &config.input_dirs {
            if output_dir.starts_with(input_dir) {
                anyhow::bail!(
                    "Output directory {} is inside input directory {}",
                    output_dir.display(),
                    input_dir.display()
                );
            }
        }
    }

    Ok(config)
}

/// Setup logging (file + console)
fn setup_logging(cli: &Cli, log_path: &Path) -> Result<WorkerGuard> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if cli.json_log {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(guard)
}
