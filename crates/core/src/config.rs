use std::env;
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{CrontentionError, Result};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIME_ZONE: &str = "UTC";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where the evaluation service lives and how the client talks to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Base URL of the evaluation service; `/evaluate` is appended.
    pub service_url: String,
    /// IANA zone the axes are labelled in at startup.
    pub time_zone: String,
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            profile: String::new(),
            service_url: DEFAULT_SERVICE_URL.to_string(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ServiceConfig {
    /// Environment over `base` (call `load_dotenv()` first). Profile is read
    /// from `CRONTENTION_PROFILE`. When set (e.g. `PROD`), every key is first
    /// looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`; keys absent
    /// from the environment keep the value `base` already has.
    pub fn from_env_over(base: Self) -> Self {
        let profile = env_or("CRONTENTION_PROFILE", "");
        Self::layered(&profile, base)
    }

    fn layered(profile: &str, base: Self) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            service_url: profiled_env_opt(p, "CRONTENTION_SERVICE_URL").unwrap_or(base.service_url),
            time_zone: profiled_env_opt(p, "CRONTENTION_TIMEZONE").unwrap_or(base.time_zone),
            request_timeout_secs: profiled_env_u64(
                p,
                "CRONTENTION_REQUEST_TIMEOUT_SECS",
                base.request_timeout_secs,
            ),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Reject a service URL the client could not issue requests to.
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.service_url).map_err(|e| {
            CrontentionError::Config(format!("invalid service url '{}': {e}", self.service_url))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CrontentionError::Config(format!(
                "service url must be http or https, was '{}'",
                parsed.scheme()
            )));
        }
        Ok(())
    }

    /// Resolve the configured zone name.
    pub fn zone(&self) -> Result<Tz> {
        parse_time_zone(&self.time_zone)
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  service:     url={}", self.service_url);
        tracing::info!("  timezone:    {}", self.time_zone);
        tracing::info!("  timeout:     {}s", self.request_timeout_secs);
    }
}

/// Look up an IANA zone identifier such as `Europe/Copenhagen`.
pub fn parse_time_zone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| CrontentionError::InvalidTimeZone(name.to_string()))
}
