//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration, read from `AQI_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Path to the model artifact (`.onnx` or `.json`)
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Port for the session API and health/metrics endpoints
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Reload the model when the artifact file changes
    #[serde(default)]
    pub watch_model: bool,

    /// Pause between words when streaming the description
    #[serde(default = "default_description_delay_ms")]
    pub description_delay_ms: u64,

    /// Sessions untouched for this many seconds are reclaimed
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,

    /// Instance name attached to every structured log line
    #[serde(default = "default_instance")]
    pub instance: String,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("model.json")
}

fn default_api_port() -> u16 {
    8080
}

fn default_description_delay_ms() -> u64 {
    5
}

fn default_session_idle_secs() -> u64 {
    30 * 60
}

fn default_instance() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "aqi-server".to_string())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            api_port: default_api_port(),
            watch_model: false,
            description_delay_ms: default_description_delay_ms(),
            session_idle_secs: default_session_idle_secs(),
            instance: default_instance(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::from_environment(config::Environment::with_prefix("AQI"))
    }

    pub fn from_environment(environment: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(environment.try_parsing(true))
            .build()
            .context("Failed to read AQI_* configuration")?;

        config
            .try_deserialize()
            .context("Invalid AQI_* configuration")
    }

    pub fn description_delay(&self) -> Duration {
        Duration::from_millis(self.description_delay_ms)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}
