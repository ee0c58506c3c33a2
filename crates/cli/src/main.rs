//! CLI entry point for seriesrip
//!
//! Merges command line flags over the optional config file, then scans, plans
//! and encodes the series directory.

use anyhow::{Context, Result};
use clap::Parser;
use seriesrip::config::HandBrakeConfig;
use seriesrip::{
    build_transcode_command, format_command, transcode_args_strings, Config, RunMode, RunReport,
    Runner, Timecode,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// seriesrip - Encode ripped TV-series discs into numbered episode files with HandBrakeCLI
#[derive(Parser, Debug)]
#[command(name = "seriesrip")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Series directory containing one directory per season
    #[arg(long)]
    source: Option<PathBuf>,

    /// Directory receiving the encoded episodes
    #[arg(long)]
    dest: Option<PathBuf>,

    /// Minimum title length counted as an episode (HH:MM:SS)
    #[arg(long)]
    duration_threshold: Option<Timecode>,

    /// Episode number of the first episode in the starting season
    #[arg(long)]
    start_episode: Option<u32>,

    /// Season that starts at --start-episode (default: the first season found)
    #[arg(long)]
    start_season: Option<u32>,

    /// Treat every chapter of a long title as its own episode
    #[arg(long)]
    chapter_as_episode: bool,

    /// Optional configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HandBrakeCLI executable
    #[arg(long)]
    handbrake: Option<PathBuf>,

    /// Preset file passed to --preset-import-file
    #[arg(long)]
    preset_file: Option<PathBuf>,

    /// Preset name passed to --preset
    #[arg(long)]
    preset: Option<String>,

    /// Scan and plan only; print the encode commands instead of running them
    #[arg(long)]
    dry_run: bool,

    /// With --dry-run, print one JSON object per planned job
    #[arg(long, requires = "dry_run")]
    json: bool,

    /// Skip startup checks (HandBrakeCLI, preset file, library roots)
    #[arg(long)]
    skip_checks: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// File (or defaults), then environment, then command line
fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config file {}", path.display()))?,
        None => {
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Some(source) = &args.source {
        config.library.source_root = source.clone();
    }
    if let Some(dest) = &args.dest {
        config.library.destination_root = dest.clone();
    }
    if let Some(threshold) = args.duration_threshold {
        config.episodes.duration_threshold = threshold;
    }
    if let Some(episode) = args.start_episode {
        config.episodes.start_episode = episode;
    }
    if let Some(season) = args.start_season {
        config.episodes.start_season = Some(season);
    }
    if args.chapter_as_episode {
        config.episodes.chapter_as_episode = true;
    }
    if let Some(handbrake) = &args.handbrake {
        config.handbrake.executable = handbrake.clone();
    }
    if let Some(preset_file) = &args.preset_file {
        config.handbrake.preset_import_file = preset_file.clone();
    }
    if let Some(preset) = &args.preset {
        config.handbrake.preset_name = preset.clone();
    }

    Ok(config)
}

fn print_plan(report: &RunReport, handbrake: &HandBrakeConfig, json: bool) -> Result<()> {
    for job in report.plans.iter().flat_map(|plan| plan.jobs.iter()) {
        if json {
            let line = serde_json::json!({
                "job": job,
                "output": job.output_path(&handbrake.container_extension),
                "args": transcode_args_strings(handbrake, job),
            });
            println!("{}", serde_json::to_string(&line)?);
        } else {
            println!("{}", format_command(&build_transcode_command(handbrake, job)));
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = build_config(&args)?;
    info!(
        source = %config.library.source_root.display(),
        dest = %config.library.destination_root.display(),
        threshold = %config.episodes.duration_threshold,
        start_episode = config.episodes.start_episode,
        chapter_as_episode = config.episodes.chapter_as_episode,
        "configuration loaded"
    );

    let mode = if args.dry_run {
        RunMode::DryRun
    } else {
        RunMode::Execute
    };

    let mut runner = if args.skip_checks {
        info!("skipping startup checks (--skip-checks enabled)");
        Runner::new_without_checks(config)?
    } else {
        Runner::new(config, mode)?
    };

    let report = runner.run(mode)?;

    if mode == RunMode::DryRun {
        print_plan(&report, &runner.config().handbrake, args.json)?;
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
