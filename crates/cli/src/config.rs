//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// CLI configuration file contents
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API endpoint URL
    pub api_url: Option<String>,
    /// Username sent on login
    pub username: Option<String>,
    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from `~/.config/aqi/config.json`, or defaults if absent
    pub fn load() -> Result<Self> {
        match dirs_next::home_dir() {
            Some(home) => Self::load_from(&Self::config_path(&home)),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).context("Failed to read config file")?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    fn config_path(home: &Path) -> PathBuf {
        home.join(".config").join("aqi").join("config.json")
    }

    /// Flag or env value first, then the config file, then the built-in default
    pub fn api_url(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn username(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.username.clone()).unwrap_or_default()
    }

    pub fn format(&self, flag: Option<OutputFormat>) -> OutputFormat {
        flag.or_else(|| self.default_format.as_deref().and_then(OutputFormat::parse))
            .unwrap_or_default()
    }
}
