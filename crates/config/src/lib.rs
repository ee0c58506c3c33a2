//! Configuration module for seriesrip
//!
//! Handles loading configuration from TOML files and environment variable overrides,
//! plus the `HH:MM:SS` timecode type used for duration thresholds.

pub mod config;
pub mod timecode;

pub use config::*;
pub use timecode::{Timecode, TimecodeError};
