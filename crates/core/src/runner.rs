//! Run orchestration for seriesrip
//!
//! Walks the series directory season by season: scans every disc image of a
//! season, plans its jobs, then encodes them one at a time before moving on
//! to the next season. Problems with a single disc, season or job are logged
//! and skipped; only an unreadable source root stops the run.

use crate::config::{Config, ConfigError, HandBrakeConfig, Timecode};
use crate::encode::{run_scan, run_transcode, HandBrakeError, ScanError};
use crate::jobs::TranscodeJob;
use crate::library::{list_subdirectories, resolve_season, series_title, LibraryError};
use crate::plan::{plan_season, DiscScan, EpisodeCursor, SeasonContext, SeasonPlan};
use crate::scan::ScanResult;
use crate::startup::{run_startup_checks, StartupError};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

/// Error type for run operations
#[derive(Debug, Error)]
pub enum RunError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Startup check failed
    #[error("Startup check failed: {0}")]
    Startup(#[from] StartupError),

    /// Source root could not be listed
    #[error("Library error: {0}")]
    Library(#[from] LibraryError),
}

/// The two external operations a run depends on
pub trait Transcoder {
    /// Scan one disc image and return its titles at least `threshold` long
    fn scan(&mut self, disc: &Path, threshold: Timecode) -> Result<ScanResult, ScanError>;

    /// Encode one job, blocking until the process exits
    fn transcode(&mut self, job: &TranscodeJob) -> Result<(), HandBrakeError>;
}

/// [`Transcoder`] backed by HandBrakeCLI subprocesses
#[derive(Debug, Clone)]
pub struct HandBrakeCli {
    config: HandBrakeConfig,
}

impl HandBrakeCli {
    pub fn new(config: HandBrakeConfig) -> Self {
        Self { config }
    }
}

impl Transcoder for HandBrakeCli {
    fn scan(&mut self, disc: &Path, threshold: Timecode) -> Result<ScanResult, ScanError> {
        run_scan(&self.config, disc, threshold)
    }

    fn transcode(&mut self, job: &TranscodeJob) -> Result<(), HandBrakeError> {
        run_transcode(&self.config, job)
    }
}

/// Whether planned jobs are encoded or only reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Execute,
    DryRun,
}

/// Counters describing what a run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub seasons_processed: u32,
    pub seasons_skipped: u32,
    pub discs_scanned: u32,
    pub discs_failed: u32,
    pub jobs_planned: u32,
    pub jobs_succeeded: u32,
    pub jobs_failed: u32,
}

/// Plans produced by a run, in processing order, with its summary
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub plans: Vec<SeasonPlan>,
    pub summary: RunSummary,
}

/// Drives one run over a series directory
pub struct Runner<T: Transcoder> {
    config: Config,
    transcoder: T,
}

impl Runner<HandBrakeCli> {
    /// Validate the configuration, run the startup checks and build a runner
    /// that shells out to HandBrakeCLI
    ///
    /// With [`RunMode::DryRun`] the destination root is checked but not created.
    pub fn new(config: Config, mode: RunMode) -> Result<Self, RunError> {
        config.validate()?;
        run_startup_checks(&config, mode == RunMode::Execute)?;
        let transcoder = HandBrakeCli::new(config.handbrake.clone());
        Ok(Self { config, transcoder })
    }

    /// Like [`Runner::new`] but without probing HandBrakeCLI or the filesystem
    pub fn new_without_checks(config: Config) -> Result<Self, RunError> {
        config.validate()?;
        let transcoder = HandBrakeCli::new(config.handbrake.clone());
        Ok(Self { config, transcoder })
    }
}

impl<T: Transcoder> Runner<T> {
    /// Runner with a caller-supplied transcoder; the configuration is not validated
    pub fn with_transcoder(config: Config, transcoder: T) -> Self {
        Self { config, transcoder }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scan every disc image directory of a season, in listing order
    ///
    /// A disc whose scan fails contributes an empty result.
    pub fn scan_discs(
        &mut self,
        discs: &[impl AsRef<Path>],
        summary: &mut RunSummary,
    ) -> Vec<DiscScan> {
        let threshold = self.config.episodes.duration_threshold;
        let mut scans = Vec::with_capacity(discs.len());

        for disc in discs {
            let disc = disc.as_ref();
            info!(disc = %disc.display(), "scanning disc image");

            let titles = match self.transcoder.scan(disc, threshold) {
                Ok(titles) => {
                    summary.discs_scanned += 1;
                    info!(disc = %disc.display(), episodes = titles.len(), "scan complete");
                    for entry in titles.iter() {
                        info!(
                            title = entry.title,
                            chapters = entry.chapter_count,
                            "found title"
                        );
                    }
                    titles
                }
                Err(e) => {
                    summary.discs_failed += 1;
                    warn!(disc = %disc.display(), error = %e, "scan failed, no titles recorded");
                    ScanResult::new()
                }
            };

            scans.push(DiscScan::new(disc, titles));
        }

        scans
    }

    /// Encode the jobs of one season in order, counting outcomes
    pub fn execute(&mut self, jobs: &[TranscodeJob], summary: &mut RunSummary) {
        for (index, job) in jobs.iter().enumerate() {
            info!(job = %job, "encoding {}/{}", index + 1, jobs.len());
            match self.transcoder.transcode(job) {
                Ok(()) => summary.jobs_succeeded += 1,
                Err(e) => {
                    summary.jobs_failed += 1;
                    error!(job = %job, error = %e, "encode failed");
                }
            }
        }
    }

    /// Process every season directory under the source root
    pub fn run(&mut self, mode: RunMode) -> Result<RunReport, RunError> {
        let source_root = self.config.library.source_root.clone();
        let destination = self.config.library.destination_root.clone();
        let title = series_title(&source_root);
        let chapter_as_episode = self.config.episodes.chapter_as_episode;

        info!(series = %title, source = %source_root.display(), "starting run");

        let mut report = RunReport::default();
        let mut cursor = EpisodeCursor::new(
            self.config.episodes.start_episode,
            self.config.episodes.start_season,
        );

        for season_dir in list_subdirectories(&source_root)? {
            let season = match resolve_season(&season_dir) {
                Ok(season) => season,
                Err(e) => {
                    report.summary.seasons_skipped += 1;
                    warn!("{}", e);
                    continue;
                }
            };

            let discs = match list_subdirectories(&season_dir) {
                Ok(discs) => discs,
                Err(e) => {
                    report.summary.seasons_skipped += 1;
                    warn!(season, error = %e, "cannot list disc images, skipping season");
                    continue;
                }
            };

            info!(season, discs = discs.len(), "processing season");
            let scans = self.scan_discs(&discs, &mut report.summary);

            let start_episode = cursor.begin_season(season);
            let ctx = SeasonContext {
                series_title: &title,
                season,
                destination: &destination,
            };
            let plan = plan_season(ctx, &scans, start_episode, chapter_as_episode);

            report.summary.seasons_processed += 1;
            report.summary.jobs_planned += plan.jobs.len() as u32;
            info!(season, jobs = plan.jobs.len(), "season planned");

            if mode == RunMode::Execute {
                self.execute(&plan.jobs, &mut report.summary);
            }

            report.plans.push(plan);
        }

        let s = &report.summary;
        info!(
            seasons = s.seasons_processed,
            seasons_skipped = s.seasons_skipped,
            discs = s.discs_scanned,
            discs_failed = s.discs_failed,
            planned = s.jobs_planned,
            succeeded = s.jobs_succeeded,
            failed = s.jobs_failed,
            "run finished"
        );

        Ok(report)
    }
}
