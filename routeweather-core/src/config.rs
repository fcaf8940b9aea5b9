use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::model::Coordinate;

/// Transport tuning: cache store location/expiry and retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    pub cache_dir: PathBuf,
    pub cache_expiry_secs: u64,
    pub retries: u32,
    pub backoff_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".cache"),
            cache_expiry_secs: 3600,
            retries: 5,
            backoff_ms: 200,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// start = { lat = 40.7128, lon = -74.0060 }
/// end = { lat = 42.3601, lon = -71.0589 }
/// start_time = "2025-01-12T10:00:00Z"
/// output = "route_with_weather_times.html"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub start: Coordinate,
    pub end: Coordinate,

    /// Departure time, RFC 3339. A value without a UTC offset is
    /// interpreted as UTC.
    pub start_time: String,

    /// Path the rendered map document is written to.
    pub output: PathBuf,

    #[serde(default)]
    pub transport: TransportConfig,
}

impl Default for Config {
    fn default() -> Self {
        // The New York → Boston example trip.
        Self {
            start: Coordinate::new(40.7128, -74.0060),
            end: Coordinate::new(42.3601, -71.0589),
            start_time: "2025-01-12T10:00:00Z".to_string(),
            output: PathBuf::from("route_with_weather_times.html"),
            transport: TransportConfig::default(),
        }
    }
}

impl Config {
    /// Load config from the platform config dir, or return the defaults
    /// if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config dir.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "routeweather", "routeweather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
