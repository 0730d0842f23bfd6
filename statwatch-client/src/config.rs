use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use statwatch_shared::config::MonitorConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_ENDPOINT: &str = "http://srv.msk01.gigacorp.local";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
pub const ENDPOINT_ENV: &str = "STATWATCH_ENDPOINT";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub log_level: String,
    pub monitor: MonitorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_level: "info".to_string(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        debug!("Loading config from: {:?}", path);
        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).context("Failed to create config directory")?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;

        info!("Config saved to: {:?}", path);
        Ok(())
    }

    pub fn clear_at(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove config file")?;
            info!("Removed config file {:?}", path);
        } else {
            info!("No config file at {:?}, nothing to clear", path);
        }
        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("statwatch").join("config.json"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Apply command line and environment overrides on top of the file.
    pub fn with_overrides(
        mut self,
        endpoint: Option<String>,
        interval_ms: Option<u64>,
        timeout_secs: Option<u64>,
    ) -> Self {
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }
        if let Some(interval_ms) = interval_ms {
            self.monitor.poll_interval_ms = interval_ms;
        }
        if let Some(timeout_secs) = timeout_secs {
            self.request_timeout_secs = timeout_secs;
        }
        self
    }
}
