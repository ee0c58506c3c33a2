//! Core configuration structures and loading logic

use crate::timecode::Timecode;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file
    Io(std::io::Error),
    /// TOML parsing error
    Parse(toml::de::Error),
    /// Configuration is structurally valid but unusable
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Where the rips live and where the encodes go
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LibraryConfig {
    /// Series directory containing one subdirectory per season
    #[serde(default)]
    pub source_root: PathBuf,
    /// Directory receiving the encoded episodes
    #[serde(default)]
    pub destination_root: PathBuf,
}

/// Episode selection and numbering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpisodeConfig {
    /// Titles shorter than this are not episodes (default 00:40:00)
    #[serde(default = "default_duration_threshold")]
    pub duration_threshold: Timecode,
    /// Episode number given to the first job of the starting season
    #[serde(default = "default_start_episode")]
    pub start_episode: u32,
    /// Season that receives `start_episode`; the first resolved season if unset
    #[serde(default)]
    pub start_season: Option<u32>,
    /// Emit one job per chapter instead of one per title
    #[serde(default)]
    pub chapter_as_episode: bool,
}

fn default_duration_threshold() -> Timecode {
    Timecode::from_minutes(40)
}

/// Largest accepted start episode
pub const MAX_START_EPISODE: u32 = 9999;

fn default_start_episode() -> u32 {
    1
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            duration_threshold: default_duration_threshold(),
            start_episode: default_start_episode(),
            start_season: None,
            chapter_as_episode: false,
        }
    }
}

/// HandBrakeCLI invocation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandBrakeConfig {
    /// Executable name or path (default `HandBrakeCLI`)
    #[serde(default = "default_executable")]
    pub executable: PathBuf,
    /// Preset file passed to `--preset-import-file`
    #[serde(default = "default_preset_import_file")]
    pub preset_import_file: PathBuf,
    /// Preset name passed to `--preset`
    #[serde(default = "default_preset_name")]
    pub preset_name: String,
    /// Working directory for every HandBrakeCLI process
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Extension of the produced episode files
    #[serde(default = "default_container_extension")]
    pub container_extension: String,
}

fn default_executable() -> PathBuf {
    PathBuf::from("HandBrakeCLI")
}

fn default_preset_import_file() -> PathBuf {
    PathBuf::from("BluRay.json")
}

fn default_preset_name() -> String {
    "Blu Ray".to_string()
}

fn default_container_extension() -> String {
    "mkv".to_string()
}

impl Default for HandBrakeConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            preset_import_file: default_preset_import_file(),
            preset_name: default_preset_name(),
            working_dir: None,
            container_extension: default_container_extension(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub episodes: EpisodeConfig,
    #[serde(default)]
    pub handbrake: HandBrakeConfig,
}

/// Accept "true", "1", "yes" as true; "false", "0", "no" as false
fn parse_flag(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Overrides the following values if environment variables are set:
    /// - SERIESRIP_SOURCE -> library.source_root
    /// - SERIESRIP_DEST -> library.destination_root
    /// - SERIESRIP_DURATION_THRESHOLD -> episodes.duration_threshold
    /// - SERIESRIP_START_EPISODE -> episodes.start_episode
    /// - SERIESRIP_CHAPTER_AS_EPISODE -> episodes.chapter_as_episode
    /// - SERIESRIP_HANDBRAKE -> handbrake.executable
    ///
    /// Values that do not parse are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("SERIESRIP_SOURCE") {
            if !val.is_empty() {
                self.library.source_root = PathBuf::from(val);
            }
        }

        if let Ok(val) = env::var("SERIESRIP_DEST") {
            if !val.is_empty() {
                self.library.destination_root = PathBuf::from(val);
            }
        }

        if let Ok(val) = env::var("SERIESRIP_DURATION_THRESHOLD") {
            if let Ok(threshold) = val.parse::<Timecode>() {
                self.episodes.duration_threshold = threshold;
            }
        }

        if let Ok(val) = env::var("SERIESRIP_START_EPISODE") {
            if let Ok(episode) = val.parse::<u32>() {
                self.episodes.start_episode = episode;
            }
        }

        if let Ok(val) = env::var("SERIESRIP_CHAPTER_AS_EPISODE") {
            if let Some(flag) = parse_flag(&val) {
                self.episodes.chapter_as_episode = flag;
            }
        }

        if let Ok(val) = env::var("SERIESRIP_HANDBRAKE") {
            if !val.is_empty() {
                self.handbrake.executable = PathBuf::from(val);
            }
        }
    }

    /// Load configuration from file and apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Check the values a run cannot do without
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.library.source_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("source root is not set".to_string()));
        }
        if self.library.destination_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "destination root is not set".to_string(),
            ));
        }
        if self.episodes.start_episode == 0 {
            return Err(ConfigError::Invalid(
                "start episode must be at least 1".to_string(),
            ));
        }
        if self.episodes.start_episode > MAX_START_EPISODE {
            return Err(ConfigError::Invalid(format!(
                "start episode must be at most {}",
                MAX_START_EPISODE
            )));
        }
        if self.episodes.start_season == Some(0) {
            return Err(ConfigError::Invalid(
                "start season must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
