//! Configuration file support for Ascent.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/ascent/config.toml`.
//! The API origin can be overridden with the `ASCENT_API_URL` environment
//! variable.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `[api] base_url`
pub const API_URL_ENV: &str = "ASCENT_API_URL";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Backend connection settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// No timeout unless set; the transport's defaults apply
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            content_type: default_content_type(),
            timeout_secs: None,
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    /// Where the bearer token is kept between runs
    pub fn token_path(&self) -> PathBuf {
        self.data_dir.join("token")
    }
}

/// Dashboard defaults
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_period_days")]
    pub period_days: u32,

    #[serde(default = "default_recent_limit")]
    pub recent_limit: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            period_days: default_period_days(),
            recent_limit: default_recent_limit(),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:8000".into()
}

fn default_content_type() -> String {
    "application/json".into()
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    base.join("ascent")
}

fn default_period_days() -> u32 {
    7
}

fn default_recent_limit() -> u32 {
    crate::dashboard::DEFAULT_RECENT_LIMIT
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        base.join("ascent").join("config.toml")
    }

    /// Apply `ASCENT_API_URL` if it is set and non-empty
    pub fn with_env_overrides(self) -> Self {
        let url = std::env::var(API_URL_ENV).ok();
        self.with_api_url_override(url)
    }

    fn with_api_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            tracing::debug!("Using API URL from {}: {}", API_URL_ENV, url);
            self.api.base_url = url;
        }
        self
    }

    /// Reject settings no request could be built from
    pub fn validate(&self) -> Result<()> {
        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "api.base_url must start with http:// or https://, got '{}'",
                url
            )));
        }
        if self.api.content_type.trim().is_empty() {
            return Err(Error::Config("api.content_type must not be empty".into()));
        }
        crate::dashboard::Period::from_days(self.dashboard.period_days)
            .map_err(|e| Error::Config(format!("dashboard.period_days: {}", e)))?;
        Ok(())
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
