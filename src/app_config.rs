use anyhow::{anyhow, Context, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::regions::{Region, RegionCatalog};
use crate::report::TimecodeStyle;
use crate::timecode::FrameRate;
use crate::timed_text::{NormalizeOptions, DEFAULT_REGION};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Caption track timing (decoded SCC/DFXP)
    #[serde(default = "default_caption_track")]
    pub captions: TrackConfig,

    /// Subtitle track timing (iTT)
    #[serde(default = "default_subtitle_track")]
    pub subtitles: TrackConfig,

    /// Region assigned to events that carry none
    #[serde(default = "default_region")]
    pub default_region: String,

    /// Directory receiving the overlap reports
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Time format used in the tab-separated reports
    #[serde(default)]
    pub timecode_style: TimecodeStyle,

    /// Also write a JSON report next to the tables
    #[serde(default)]
    pub write_json: bool,

    /// Maximum number of file pairs checked at once in folder mode
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Regions added to (or overriding) the built-in layout zones
    #[serde(default)]
    pub extra_regions: BTreeMap<String, Region>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Frame rates of one track
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TrackConfig {
    /// Rate the file's timecodes were authored at
    pub frame_rate: FrameRate,

    /// Rate to conform the track's frames to before comparing
    #[serde(default)]
    pub target_frame_rate: Option<FrameRate>,
}

impl TrackConfig {
    pub fn new(frame_rate: FrameRate) -> Self {
        Self {
            frame_rate,
            target_frame_rate: None,
        }
    }

    // @returns: Rate the normalized track ends up on
    pub fn effective_frame_rate(&self) -> FrameRate {
        self.target_frame_rate.unwrap_or(self.frame_rate)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_caption_track() -> TrackConfig {
    TrackConfig::new(FrameRate::FPS_29_97)
}

fn default_subtitle_track() -> TrackConfig {
    TrackConfig::new(FrameRate::FPS_23_976)
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_output_dir() -> String {
    "results".to_string()
}

fn default_max_concurrent_jobs() -> usize {
    4
}

impl Config {
    /// Load the configuration file, writing a default one if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.default_region.trim().is_empty() {
            return Err(anyhow!("Default region must not be empty"));
        }

        if self.max_concurrent_jobs == 0 {
            return Err(anyhow!("max_concurrent_jobs must be at least 1"));
        }

        if self.output_dir.trim().is_empty() {
            return Err(anyhow!("Output directory must not be empty"));
        }

        for (name, region) in &self.extra_regions {
            // NaN fails this comparison
            if !(region.width > 0.0 && region.height > 0.0) {
                return Err(anyhow!("Region '{}' must have a positive width and height", name));
            }
            if ![region.x, region.y, region.width, region.height].iter().all(|v| v.is_finite()) {
                return Err(anyhow!("Region '{}' must have finite coordinates", name));
            }
        }

        Ok(())
    }

    // @returns: Normalization settings for the caption track
    pub fn caption_options(&self) -> NormalizeOptions {
        Self::track_options(&self.captions, &self.default_region, "captions")
    }

    // @returns: Normalization settings for the subtitle track
    pub fn subtitle_options(&self) -> NormalizeOptions {
        Self::track_options(&self.subtitles, &self.default_region, "subtitles")
    }

    fn track_options(track: &TrackConfig, default_region: &str, label: &str) -> NormalizeOptions {
        NormalizeOptions::new(track.frame_rate)
            .target(track.target_frame_rate)
            .default_region(default_region)
            .label(label)
    }

    /// Built-in regions plus the configured extras
    pub fn region_catalog(&self) -> RegionCatalog {
        let mut catalog = RegionCatalog::builtin();
        catalog.extend(&self.extra_regions);
        catalog
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            captions: default_caption_track(),
            subtitles: default_subtitle_track(),
            default_region: default_region(),
            output_dir: default_output_dir(),
            timecode_style: TimecodeStyle::default(),
            write_json: false,
            max_concurrent_jobs: default_max_concurrent_jobs(),
            extra_regions: BTreeMap::new(),
            log_level: LogLevel::default(),
        }
    }
}
