//! Layered configuration for the playback core.
//!
//! Settings are persisted as `config.json` with a version stamp; a missing
//! or invalid file falls back to defaults.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunable parameters of the playback core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Target number of envelope bars produced by the reducer.
    pub envelope_bars: usize,
    /// Interval of the playback clock tick in milliseconds (~30 Hz).
    pub tick_interval_ms: u64,
    /// Minimum wall-clock spacing between haptic pulses in milliseconds.
    pub min_pulse_interval_ms: u64,
    /// Envelope values at or below this floor never trigger a pulse.
    pub amplitude_floor: f32,
    /// Lower bound applied to pulse intensity.
    pub intensity_floor: f32,
    /// Added to intensity to derive pulse sharpness.
    pub sharpness_offset: f32,
    /// Upper bound applied to pulse sharpness.
    pub sharpness_cap: f32,
    /// Playback counts as finished within this many seconds of the end.
    pub end_epsilon_seconds: f64,
    /// Master switch for haptic pulses.
    pub haptics_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            envelope_bars: 360,
            tick_interval_ms: 33,
            min_pulse_interval_ms: 80,
            amplitude_floor: 0.02,
            intensity_floor: 0.1,
            sharpness_offset: 0.2,
            sharpness_cap: 0.95,
            end_epsilon_seconds: 0.05,
            haptics_enabled: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(String),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("failed to write config: {0}")]
    Write(String),
}

/// Persisted configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    pub settings: Settings,
    pub created_at: String,
    pub modified_at: String,
}

/// Loads and persists [`Settings`].
///
/// Defaults to `config.json` in the current working directory when no path
/// is provided.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(config_path: Option<PathBuf>) -> Self {
        let config_path = config_path.unwrap_or_else(|| PathBuf::from("config.json"));
        Self {
            config_path,
            settings: Settings::default(),
        }
    }

    /// Load settings from the configuration file.
    ///
    /// Creates a default config file if none exists.
    pub fn load(&mut self) -> Result<Settings, ConfigError> {
        if !self.config_path.exists() {
            self.save()?;
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| ConfigError::Read(e.to_string()))?;

        let config_file: ConfigFile =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        if config_file.version != env!("CARGO_PKG_VERSION") {
            log::warn!(
                "Config file version {} doesn't match application version {}; new settings use defaults",
                config_file.version,
                env!("CARGO_PKG_VERSION")
            );
        }

        self.settings = config_file.settings;
        Ok(self.settings.clone())
    }

    /// Persist the current settings.
    pub fn save(&self) -> Result<(), ConfigError> {
        let now = Utc::now().to_rfc3339();
        let config_file = ConfigFile {
            version: env!("CARGO_PKG_VERSION").to_string(),
            settings: self.settings.clone(),
            created_at: now.clone(),
            modified_at: now,
        };

        let content = serde_json::to_string_pretty(&config_file)
            .map_err(|e| ConfigError::Write(e.to_string()))?;
        fs::write(&self.config_path, content).map_err(|e| ConfigError::Write(e.to_string()))?;
        Ok(())
    }

    /// Get the current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the current settings (persist with [`save`](Self::save)).
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Path of the backing config file.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}
