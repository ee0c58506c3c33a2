//! Startup checks module for seriesrip
//!
//! Provides preflight checks run before any disc is scanned:
//! - HandBrakeCLI availability (and its reported version)
//! - Preset import file presence
//! - Source root readability and destination root creation

use crate::config::{Config, HandBrakeConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::info;

/// Error types for startup checks
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("HandBrakeCLI not available: {0}")]
    HandBrakeUnavailable(String),

    #[error("Preset file not found: {}", .0.display())]
    PresetMissing(PathBuf),

    #[error("Source root is not a directory: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("Cannot create destination {}: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Parse the HandBrake version banner and extract `(major, minor, patch)`
///
/// Handles the formats HandBrakeCLI prints for `--version`:
/// - Release: "HandBrake 1.7.2"
/// - Snapshot: "HandBrake 20240102123456-abc1234-master"
///
/// Snapshots carry no semantic version and yield `None`.
pub fn parse_handbrake_version(version_output: &str) -> Option<(u32, u32, u32)> {
    let version_line = version_output
        .lines()
        .find(|line| line.trim_start().starts_with("HandBrake "))?;

    let version_part = version_line.trim().split_whitespace().nth(1)?;

    let mut parts = version_part.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts
        .next()
        .map(|p| {
            p.chars()
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>()
        })
        .and_then(|p| p.parse().ok())
        .unwrap_or(0);

    Some((major, minor, patch))
}

/// Check if HandBrakeCLI is available by running `<executable> --version`
pub fn check_handbrake_available(cfg: &HandBrakeConfig) -> Result<(), StartupError> {
    let mut cmd = Command::new(&cfg.executable);
    if let Some(dir) = &cfg.working_dir {
        cmd.current_dir(dir);
    }

    let output = cmd.arg("--version").output().map_err(|e| {
        StartupError::HandBrakeUnavailable(format!(
            "{} --version failed; is HandBrakeCLI installed and in PATH? Error: {}",
            cfg.executable.display(),
            e
        ))
    })?;

    if !output.status.success() {
        return Err(StartupError::HandBrakeUnavailable(format!(
            "{} --version exited with {}",
            cfg.executable.display(),
            output.status
        )));
    }

    // Some builds print the banner on stderr
    let mut banner = String::from_utf8_lossy(&output.stdout).into_owned();
    banner.push_str(&String::from_utf8_lossy(&output.stderr));

    match parse_handbrake_version(&banner) {
        Some((major, minor, patch)) => {
            info!(version = %format!("{}.{}.{}", major, minor, patch), "found HandBrakeCLI")
        }
        None => info!("found HandBrakeCLI (unrecognised version banner)"),
    }

    Ok(())
}

/// Where HandBrakeCLI will look for the preset import file
///
/// Relative paths resolve against the configured working directory, if any.
pub fn resolve_preset_path(cfg: &HandBrakeConfig) -> PathBuf {
    match &cfg.working_dir {
        Some(dir) if cfg.preset_import_file.is_relative() => dir.join(&cfg.preset_import_file),
        _ => cfg.preset_import_file.clone(),
    }
}

/// Check that the preset import file exists
pub fn check_preset_file(cfg: &HandBrakeConfig) -> Result<(), StartupError> {
    let path = resolve_preset_path(cfg);
    if path.is_file() {
        Ok(())
    } else {
        Err(StartupError::PresetMissing(path))
    }
}

/// Check the source root and, when `create_destination` is set, create the
/// destination root if missing
pub fn check_library_roots(
    source: &Path,
    destination: &Path,
    create_destination: bool,
) -> Result<(), StartupError> {
    if !source.is_dir() {
        return Err(StartupError::SourceMissing(source.to_path_buf()));
    }
    if !create_destination {
        return Ok(());
    }

    fs::create_dir_all(destination).map_err(|source| StartupError::Destination {
        path: destination.to_path_buf(),
        source,
    })
}

/// Run all startup checks in order
///
/// Checks are run in the following order:
/// 1. Library roots
/// 2. HandBrakeCLI availability
/// 3. Preset file
///
/// The destination root is only created when `create_destination` is set.
pub fn run_startup_checks(cfg: &Config, create_destination: bool) -> Result<(), StartupError> {
    check_library_roots(
        &cfg.library.source_root,
        &cfg.library.destination_root,
        create_destination,
    )?;
    check_handbrake_available(&cfg.handbrake)?;
    check_preset_file(&cfg.handbrake)?;
    Ok(())
}
