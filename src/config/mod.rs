//! Configuration management for watchpost.
//!
//! Configuration is read from `~/.config/watchpost/config.toml` unless a path
//! is given explicitly. A missing file means defaults; every section and field
//! is optional.

use crate::domain::Target;
use crate::fetcher::FetchConfig;
use crate::ingest::{DEFAULT_FEED_BASE, DEFAULT_SITE_BASE};
use crate::scraper::ScraperConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub feeds: FeedsConfig,
    pub scraper: ScraperConfig,
    pub cache: CacheConfig,
    /// Monitored sources, read-only input to `watchpost run`.
    pub targets: Vec<Target>,
}

/// Hosts used for channel resolution and feed retrieval.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    /// Channel pages are fetched from here (default: https://www.youtube.com)
    pub site_base: String,
    /// Feed endpoint that takes a `channel_id` query parameter
    pub feed_base: String,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            site_base: DEFAULT_SITE_BASE.to_string(),
            feed_base: DEFAULT_FEED_BASE.to_string(),
        }
    }
}

/// Location of the change-detection cache file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Defaults to `<data_dir>/watchpost/cache.json`
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `path`, or from the default location when
    /// `path` is `None`.
    ///
    /// A missing file at the default location yields defaults. An explicitly
    /// requested file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let default_path = Self::default_config_path()?;
                if !default_path.exists() {
                    return Ok(Self::default());
                }
                Self::from_file(&default_path)
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/watchpost/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("watchpost").join("config.toml"))
    }

    /// Cache file path, falling back to the platform data directory.
    pub fn cache_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.cache.path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
        Ok(data_dir.join("watchpost").join("cache.json"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Failed to read config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
