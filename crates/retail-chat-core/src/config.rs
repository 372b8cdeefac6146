use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::controller::DEFAULT_TIMEOUT;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

pub const ENV_API_URL: &str = "RETAIL_CHAT_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "RETAIL_CHAT_TIMEOUT_SECS";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the config file (defaults when absent), then apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let config = Self::load_from(&Self::get_config_path()?)?;
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// Every field spelled out with its default value.
    pub fn defaults() -> Self {
        Self {
            api_base_url: Some(DEFAULT_API_BASE_URL.to_string()),
            request_timeout_secs: Some(DEFAULT_TIMEOUT.as_secs()),
        }
    }

    /// Write the defaults to the config path on first start so there is a
    /// file to edit. An existing file is never touched.
    pub fn init_file() -> Result<PathBuf> {
        let path = Self::get_config_path()?;
        Self::init_file_at(&path)?;
        Ok(path)
    }

    /// Returns whether a new file was written.
    pub fn init_file_at(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        Self::defaults().save_to(path)?;
        Ok(true)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Values found through `lookup` win over the file. Unparseable timeouts
    /// are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = Some(url);
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS).and_then(|s| s.trim().parse().ok()) {
            self.request_timeout_secs = Some(secs);
        }
        self
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("retail-chat").join("config.json"))
    }
}
