//! HandBrakeCLI invocation for disc scans and episode encodes
//!
//! Both kinds of process report progress on stderr. Scans are parsed as they
//! stream; encode output is forwarded to the log.

use crate::config::{HandBrakeConfig, Timecode};
use crate::jobs::{Selection, TranscodeJob};
use crate::scan::{parse_scan, ProtocolError, ScanResult};
use std::ffi::OsString;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Error type for HandBrakeCLI processes
#[derive(Debug, Error)]
pub enum HandBrakeError {
    /// The executable could not be started
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// HandBrakeCLI exited with non-zero status
    #[error("HandBrakeCLI failed with exit code: {0}")]
    Failed(i32),

    /// HandBrakeCLI was terminated by signal
    #[error("HandBrakeCLI process was terminated by signal")]
    Terminated,

    /// IO error while talking to the process
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Error type for scanning one disc image
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Scan process error: {0}")]
    Process(#[from] HandBrakeError),

    #[error("Unexpected scan output: {0}")]
    Protocol(#[from] ProtocolError),
}

fn base_command(cfg: &HandBrakeConfig) -> Command {
    let mut cmd = Command::new(&cfg.executable);
    if let Some(dir) = &cfg.working_dir {
        cmd.current_dir(dir);
    }
    cmd
}

/// Build the scan command for one disc image directory
///
/// `-t 0` asks HandBrake to scan every title on the disc.
pub fn build_scan_command(cfg: &HandBrakeConfig, disc: &Path) -> Command {
    let mut cmd = base_command(cfg);
    cmd.arg("-t").arg("0");
    cmd.arg("--scan");
    cmd.arg("--input").arg(disc);
    cmd
}

/// Arguments for encoding one job, in the order HandBrakeCLI receives them
pub fn transcode_args(cfg: &HandBrakeConfig, job: &TranscodeJob) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--preset-import-file".into(),
        cfg.preset_import_file.clone().into(),
        "--preset".into(),
        cfg.preset_name.clone().into(),
        "--input".into(),
        job.source_directory.clone().into(),
        "--output".into(),
        job.output_path(&cfg.container_extension).into(),
        "--title".into(),
        job.title_track.to_string().into(),
    ];

    if let Selection::Chapter(chapter) = job.selection {
        args.push("-c".into());
        args.push(chapter.to_string().into());
    }

    args
}

/// [`transcode_args`] as display strings, for logs and plan output
pub fn transcode_args_strings(cfg: &HandBrakeConfig, job: &TranscodeJob) -> Vec<String> {
    transcode_args(cfg, job)
        .iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

/// Build the encode command for one job
pub fn build_transcode_command(cfg: &HandBrakeConfig, job: &TranscodeJob) -> Command {
    let mut cmd = base_command(cfg);
    cmd.args(transcode_args(cfg, job));
    cmd
}

/// Renders a command the way a shell user would type it
pub fn format_command(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|part| {
            let part = part.to_string_lossy();
            if part.is_empty() || part.contains(char::is_whitespace) {
                format!("\"{}\"", part)
            } else {
                part.into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn spawn_with_stderr(cmd: &mut Command) -> Result<Child, HandBrakeError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| HandBrakeError::Spawn {
            program: cmd.get_program().to_string_lossy().into_owned(),
            source,
        })
}

fn check_status(status: ExitStatus) -> Result<(), HandBrakeError> {
    if status.success() {
        Ok(())
    } else {
        match status.code() {
            Some(code) => Err(HandBrakeError::Failed(code)),
            None => Err(HandBrakeError::Terminated),
        }
    }
}

fn take_stderr(child: &mut Child) -> Result<BufReader<std::process::ChildStderr>, HandBrakeError> {
    child.stderr.take().map(BufReader::new).ok_or_else(|| {
        HandBrakeError::Io(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "stderr was not captured",
        ))
    })
}

/// Scan one disc image and collect the titles at least `threshold` long
///
/// Output after the last title block is drained so the process can exit.
/// A non-zero exit after a successful parse is logged, not returned.
pub fn run_scan(
    cfg: &HandBrakeConfig,
    disc: &Path,
    threshold: Timecode,
) -> Result<ScanResult, ScanError> {
    let mut cmd = build_scan_command(cfg, disc);
    debug!(command = %format_command(&cmd), "starting scan");

    let mut child = spawn_with_stderr(&mut cmd)?;
    let mut stderr = take_stderr(&mut child)?;

    let parsed = parse_scan(&mut stderr, threshold);

    let mut buf = Vec::new();
    loop {
        buf.clear();
        match stderr.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => trace!(
                target: "seriesrip::scan::output",
                "{}",
                String::from_utf8_lossy(&buf).trim_end()
            ),
            Err(e) => {
                warn!(error = %e, "failed to drain scan output");
                break;
            }
        }
    }

    let status = child.wait().map_err(HandBrakeError::Io)?;
    if let Err(e) = check_status(status) {
        warn!(disc = %disc.display(), error = %e, "scan process exited abnormally");
    }

    Ok(parsed?)
}

/// Execute one encode, forwarding HandBrake's stderr to the log
///
/// # Errors
/// Returns an error if:
/// - The HandBrakeCLI process fails to start (IO error)
/// - The process exits with non-zero status
/// - The process is terminated by a signal
pub fn run_transcode(cfg: &HandBrakeConfig, job: &TranscodeJob) -> Result<(), HandBrakeError> {
    let mut cmd = build_transcode_command(cfg, job);
    debug!(command = %format_command(&cmd), "starting encode");

    let mut child = spawn_with_stderr(&mut cmd)?;
    let stderr = take_stderr(&mut child)?;

    for line in stderr.split(b'\n') {
        match line {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                debug!(target: "seriesrip::encode::output", "{}", text.trim_end());
            }
            Err(e) => {
                warn!(error = %e, "failed to read encode output");
                break;
            }
        }
    }

    let status = child.wait()?;
    check_status(status)
}
