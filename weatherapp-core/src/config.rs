use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::controller::{ControllerOptions, IncompletePolicy, ResponseOrdering};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "WEATHERAPP_API_KEY";

pub const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com";

const DEFAULT_LOADING_TIMEOUT_SECS: u64 = 5;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// loading_timeout_secs = 5
/// on_incomplete = "fail"
/// ordering = "latest-request"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,

    pub base_url: String,

    /// Seconds without a terminal state before the loading display gives up.
    pub loading_timeout_secs: u64,

    pub on_incomplete: IncompletePolicy,

    pub ordering: ResponseOrdering,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            loading_timeout_secs: DEFAULT_LOADING_TIMEOUT_SECS,
            on_incomplete: IncompletePolicy::default(),
            ordering: ResponseOrdering::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherapp", "weatherapp")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// API key from the environment, falling back to the stored one.
    pub fn resolved_api_key(&self) -> Option<String> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        pick_api_key(from_env, self.api_key.as_deref())
    }

    pub fn loading_timeout(&self) -> Duration {
        Duration::from_secs(self.loading_timeout_secs)
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            on_incomplete: self.on_incomplete,
            ordering: self.ordering,
        }
    }
}

fn pick_api_key(from_env: Option<String>, stored: Option<&str>) -> Option<String> {
    from_env
        .filter(|key| !key.trim().is_empty())
        .or_else(|| stored.filter(|key| !key.trim().is_empty()).map(str::to_owned))
}
