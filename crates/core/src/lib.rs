//! seriesrip
//!
//! Batch-encodes a directory of ripped TV-series discs with HandBrakeCLI: scans
//! each disc image, keeps titles long enough to be episodes, numbers them per
//! season and encodes them one at a time.

pub mod encode;
pub mod jobs;
pub mod library;
pub mod plan;
pub mod runner;
pub mod scan;
pub mod startup;

pub use encode::{
    build_scan_command, build_transcode_command, format_command, run_scan, run_transcode,
    transcode_args, transcode_args_strings, HandBrakeError, ScanError,
};
pub use jobs::{Selection, TranscodeJob};
pub use library::{list_subdirectories, resolve_season, season_number, series_title, LibraryError};
pub use plan::{plan_season, DiscScan, EpisodeCursor, SeasonContext, SeasonPlan};
pub use runner::{HandBrakeCli, RunError, RunMode, RunReport, RunSummary, Runner, Transcoder};
pub use scan::{parse_scan, ProtocolError, ScanParser, ScanResult, TitleEntry};
pub use seriesrip_config as config;
pub use seriesrip_config::{Config, Timecode};
pub use startup::{
    check_handbrake_available, check_library_roots, check_preset_file, parse_handbrake_version,
    run_startup_checks, StartupError,
};
