//! Optional TOML configuration at `<config_dir>/weekgrid/config.toml`.
//!
//! ```toml
//! timezone = "Europe/Berlin"
//! days_past = 1
//! days_future = 6
//! cache_dir = "/var/cache/weekgrid"
//! cache_ttl_minutes = 30
//!
//! [[feeds]]
//! id = "work"
//! url = "webcal://cal.example.com/team.ics"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub timezone: Option<String>,
    pub days_past: Option<u32>,
    pub days_future: Option<u32>,
    pub cache_dir: Option<PathBuf>,
    pub cache_ttl_minutes: Option<u64>,
    #[serde(default)]
    pub feeds: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
pub struct FeedEntry {
    pub id: String,
    pub url: String,
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weekgrid").join("config.toml"))
    }

    /// Load `path`, or the default location when `path` is `None`.
    ///
    /// An explicitly named file must exist; a missing default file yields the
    /// empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !required && !path.exists() {
            tracing::debug!(path = %path.display(), "no config file");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), feeds = config.feeds.len(), "loaded config");
        Ok(config)
    }
}
