//! Configuration management for the SimpleEQ editor
//!
//! This module provides:
//! - Display conventions for the response plot (frequency and gain bounds)
//! - Refresh rate of the redraw poller and plot geometry
//! - TOML loading/saving with a fallback to defaults on missing or corrupt files

use crate::domain::parameters::ranges;
use crate::domain::response::{CurveSampler, DecibelRange, FrequencyAxis, PlotArea};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, error, info, instrument};

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Lowest frequency on the plot (Hz)
    pub min_frequency: f64,

    /// Highest frequency on the plot (Hz)
    pub max_frequency: f64,

    /// Gain shown at the bottom edge of the plot (dB)
    pub min_db: f64,

    /// Gain shown at the top edge of the plot (dB)
    pub max_db: f64,

    /// Redraw poller frequency in Hz
    pub refresh_hz: u32,

    /// Sample rate assumed until the audio engine reports one
    pub default_sample_rate: f64,

    /// Plot width in pixels
    pub plot_width: i32,

    /// Plot height in pixels
    pub plot_height: i32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_frequency: ranges::FREQ_MIN,
            max_frequency: ranges::FREQ_MAX,
            min_db: ranges::GAIN_MIN,
            max_db: ranges::GAIN_MAX,
            refresh_hz: 60,
            default_sample_rate: 44100.0,
            // Top third of a 600x400 editor
            plot_width: 600,
            plot_height: 133,
        }
    }
}

impl EditorConfig {
    pub const REFRESH_HZ_MAX: u32 = 240;

    /// Check that all ranges are usable for plotting
    pub fn validate(&self) -> Result<()> {
        if !(self.min_frequency > 0.0 && self.min_frequency < self.max_frequency)
            || !self.max_frequency.is_finite()
        {
            return Err(ConfigError::Invalid(format!(
                "frequency range {}..{} Hz must be finite, positive and increasing",
                self.min_frequency, self.max_frequency
            )));
        }
        if !(self.min_db < self.max_db) || !self.min_db.is_finite() || !self.max_db.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "gain range {}..{} dB must be finite and increasing",
                self.min_db, self.max_db
            )));
        }
        if !(1..=Self::REFRESH_HZ_MAX).contains(&self.refresh_hz) {
            return Err(ConfigError::Invalid(format!(
                "refresh rate {} Hz outside 1..={}",
                self.refresh_hz,
                Self::REFRESH_HZ_MAX
            )));
        }
        if !(self.default_sample_rate > 0.0 && self.default_sample_rate.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "default sample rate {} must be positive",
                self.default_sample_rate
            )));
        }
        if self.plot_height < 0 {
            return Err(ConfigError::Invalid(format!(
                "plot height {} must not be negative",
                self.plot_height
            )));
        }
        Ok(())
    }

    pub fn frequency_axis(&self) -> FrequencyAxis {
        FrequencyAxis::new(self.min_frequency, self.max_frequency)
    }

    pub fn db_range(&self) -> DecibelRange {
        DecibelRange {
            min: self.min_db,
            max: self.max_db,
        }
    }

    pub fn sampler(&self) -> CurveSampler {
        CurveSampler::new(self.frequency_axis(), self.db_range())
    }

    pub fn plot_area(&self) -> PlotArea {
        PlotArea::new(0, 0, self.plot_width, self.plot_height)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.refresh_hz.max(1)))
    }

    /// Load configuration from TOML file
    #[instrument(skip(path))]
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let contents = fs::read_to_string(path).await?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Save configuration to TOML file
    #[instrument(skip(self, path))]
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        info!(path = %path.display(), "Saving configuration");

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        fs::write(path, toml_str).await?;

        debug!("Configuration saved successfully");
        Ok(())
    }
}

/// Manages the editor config file at `~/.config/simpleeq/editor.toml`
pub struct ConfigManager {
    config_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_path = config_dir.join("editor.toml");
        Self {
            config_dir,
            config_path,
        }
    }

    /// Manager for an explicit file path
    pub fn for_file(config_path: PathBuf) -> Self {
        let config_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            config_dir,
            config_path,
        }
    }

    /// Get the default config directory path
    ///
    /// Returns `~/.config/simpleeq` on Linux, the platform equivalent elsewhere
    pub fn default_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("simpleeq"))
            .ok_or_else(|| ConfigError::Invalid("Could not determine config directory".to_string()))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from file
    ///
    /// If the config file doesn't exist, returns defaults.
    /// If the config file is corrupt, logs an error, backs it up and returns defaults.
    #[instrument(skip(self))]
    pub async fn load(&self) -> EditorConfig {
        if !self.config_path.exists() {
            info!(
                path = %self.config_path.display(),
                "Config file not found, using defaults"
            );
            return EditorConfig::default();
        }

        match EditorConfig::load_from_file(&self.config_path).await {
            Ok(config) => config,
            Err(e) => {
                error!(
                    path = %self.config_path.display(),
                    error = %e,
                    "Failed to load config, using defaults"
                );

                let backup_path = self.config_path.with_extension("toml.corrupt");
                if let Err(copy_err) = fs::copy(&self.config_path, &backup_path).await {
                    error!(
                        path = %backup_path.display(),
                        error = %copy_err,
                        "Failed to backup corrupt config"
                    );
                }

                EditorConfig::default()
            }
        }
    }

    /// Save configuration to file
    #[instrument(skip(self, config))]
    pub async fn save(&self, config: &EditorConfig) -> Result<()> {
        config.validate()?;
        fs::create_dir_all(&self.config_dir).await?;
        config.save_to_file(&self.config_path).await
    }

    pub fn exists(&self) -> bool {
        self.config_path.exists()
    }
}
