//! Encoding modules for seriesrip

pub mod handbrake;

pub use handbrake::{
    build_scan_command, build_transcode_command, format_command, run_scan, run_transcode,
    transcode_args, transcode_args_strings, HandBrakeError, ScanError,
};
