//! Configuration file loading
//!
//! ```yaml
//! database: /var/lib/blogpost/blog.db
//! timezone: Europe/Berlin
//! log_level: debug
//! ```
//!
//! Every key is optional.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Unknown time zone: {0}")]
    TimeZone(String),

    #[error("Unknown log level: {0}")]
    LogLevel(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file
    pub database: PathBuf,
    /// IANA zone used to default a post's year and month
    pub timezone: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Self::default_database_path(),
            timezone: "UTC".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as null rather than an empty map
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Load `path` if given; otherwise the default file if it exists, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// `~/.config/blogpost/config.yaml` (platform equivalent)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("blogpost").join("config.yaml"))
    }

    /// `~/.local/share/blogpost/blog.db` (platform equivalent)
    pub fn default_database_path() -> PathBuf {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
        data_dir.join("blogpost").join("blog.db")
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .trim()
            .parse::<Tz>()
            .map_err(|_| ConfigError::TimeZone(self.timezone.clone()))
    }

    pub fn log_level(&self) -> Result<tracing::Level, ConfigError> {
        self.log_level
            .trim()
            .parse::<tracing::Level>()
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }
}
