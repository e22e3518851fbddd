use crate::error::ConfigError;
use crate::marketplace::Marketplace;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration loaded from ~/.config/seriesctl/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub ignore: IgnoreConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// Short marketplace code, e.g. "au"
    pub marketplace: Option<String>,
}

/// Series excluded from the new-release report
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IgnoreConfig {
    #[serde(default)]
    pub series: Vec<String>,
}

/// Settings for series listing probes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum listings fetched at once (default: one per series)
    pub max_concurrent: Option<usize>,

    /// chrono format of the release date shown on listing pages
    #[serde(default = "default_listing_date_format")]
    pub listing_date_format: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_listing_date_format() -> String {
    "%d-%m-%Y".to_string()
}

fn default_user_agent() -> String {
    format!("seriesctl/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_concurrent: None,
            listing_date_format: default_listing_date_format(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    /// Override for the session file location
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path (~/.config/seriesctl/config.toml)
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save configuration to a specific path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
        tracing::info!("saved config to {}", path.display());
        Ok(())
    }

    /// Directory holding config and session files
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("seriesctl"))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Session file path, with config override taking precedence
    pub fn session_path(&self) -> Result<PathBuf> {
        match &self.session.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("session.json")),
        }
    }

    /// Resolve the marketplace, with CLI override taking precedence
    pub fn marketplace(&self, cli_override: Option<&str>) -> Result<Marketplace, ConfigError> {
        let code = cli_override
            .or(self.user.marketplace.as_deref())
            .ok_or(ConfigError::MarketplaceNotSet)?;
        Marketplace::from_code(code)
    }

    pub fn is_ignored(&self, series: &str) -> bool {
        self.ignore.series.iter().any(|s| s == series)
    }
}
