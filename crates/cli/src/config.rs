use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crontention_core::config::{
    ServiceConfig, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVICE_URL, DEFAULT_TIME_ZONE,
};

/// CLI configuration loaded from TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Evaluation service base URL
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// IANA zone for axis labels
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Date used when none is given on the command line
    #[serde(default)]
    pub default_date: Option<String>,
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            time_zone: default_time_zone(),
            request_timeout_secs: default_timeout(),
            default_date: None,
        }
    }
}

impl CliConfig {
    /// Return the default config directory path: ~/.config/crontention/
    pub fn default_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("could not determine user config directory")?
            .join("crontention");
        Ok(config_dir)
    }

    /// Return the default config file path.
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.toml"))
    }

    /// Load config from the given path, or the default path.
    /// Writes and returns defaults if the file does not exist.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_config_path()?,
        };

        if config_path.exists() {
            debug!(?config_path, "Loading config");
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read config: {}", config_path.display()))?;
            Self::parse(&content)
                .with_context(|| format!("failed to parse config: {}", config_path.display()))
        } else {
            debug!(?config_path, "Config file not found, using defaults");
            let config = Self::default();
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent).ok();
            }
            let toml_str = toml::to_string_pretty(&config)
                .context("failed to serialize default config")?;
            std::fs::write(&config_path, toml_str).ok();
            Ok(config)
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// File values as a service config, before environment and flags.
    fn as_service_config(&self) -> ServiceConfig {
        ServiceConfig {
            profile: String::new(),
            service_url: self.service_url.clone(),
            time_zone: self.time_zone.clone(),
            request_timeout_secs: self.request_timeout_secs,
        }
    }

    /// Resolve the effective service config.
    /// Priority: cli_override > env var > config file > default.
    pub fn resolve(&self, server: Option<&str>, timezone: Option<&str>) -> ServiceConfig {
        let mut resolved = ServiceConfig::from_env_over(self.as_service_config());
        if let Some(url) = server {
            resolved.service_url = url.to_string();
        }
        if let Some(zone) = timezone {
            resolved.time_zone = zone.to_string();
        }
        resolved
    }

    /// Resolve the reference date. Priority: cli_override > config file > "today".
    pub fn resolve_date(&self, cli_override: Option<&str>) -> String {
        cli_override
            .map(str::to_string)
            .or_else(|| self.default_date.clone())
            .unwrap_or_default()
    }
}
