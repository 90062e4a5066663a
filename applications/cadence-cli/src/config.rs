/// Application configuration
use crate::error::{CliError, Result};
use cadence_playback::{PlaybackConfig, ServiceConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "cadence.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_simulation")]
    pub simulation: SimulationSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_queue_file")]
    pub queue_file: PathBuf,

    /// Directory holding `<cover_art>.jpg` files for notifications
    #[serde(default)]
    pub cover_art_dir: Option<PathBuf>,
}

/// Timing of the simulated local player
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationSettings {
    /// Length of tracks without a known duration
    #[serde(default = "default_track_length_secs")]
    pub track_length_secs: u64,

    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl SimulationSettings {
    pub fn track_length(&self) -> Duration {
        Duration::from_secs(self.track_length_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given. Otherwise `cadence.toml` in the working
    /// directory is used if present. `CADENCE_`-prefixed variables override
    /// both, with `__` between nested keys (`CADENCE_PLAYBACK__REPEAT=all`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.service.startup_attempts == 0 {
            return Err(CliError::Config(
                "service.startup_attempts must be at least 1".to_string(),
            ));
        }

        if self.service.command_timeout_ms == 0 {
            return Err(CliError::Config(
                "service.command_timeout_ms must be positive".to_string(),
            ));
        }

        if self.service.queue_capacity == 0 {
            return Err(CliError::Config(
                "service.queue_capacity must be at least 1".to_string(),
            ));
        }

        if self.storage.queue_file.as_os_str().is_empty() {
            return Err(CliError::Config("storage.queue_file is required".to_string()));
        }

        if let Some(dir) = &self.storage.cover_art_dir {
            if !dir.is_dir() {
                return Err(CliError::Config(format!(
                    "Cover art directory not found at {:?}",
                    dir
                )));
            }
        }

        if self.simulation.tick_ms == 0 || self.simulation.track_length_secs == 0 {
            return Err(CliError::Config(
                "simulation.tick_ms and simulation.track_length_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_storage() -> StorageSettings {
    StorageSettings {
        queue_file: default_queue_file(),
        cover_art_dir: None,
    }
}

fn default_queue_file() -> PathBuf {
    PathBuf::from("./data/queue.json")
}

fn default_simulation() -> SimulationSettings {
    SimulationSettings {
        track_length_secs: default_track_length_secs(),
        tick_ms: default_tick_ms(),
    }
}

fn default_track_length_secs() -> u64 {
    30
}

fn default_tick_ms() -> u64 {
    250
}
