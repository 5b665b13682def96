//! Engine settings.
//!
//! Resolved once at start-up, in increasing precedence: built-in defaults,
//! an optional TOML file, then `APITEST_*` environment variables (a `.env`
//! file in the working directory is loaded first). The result is immutable
//! and handed to the executor at construction.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::EngineError;

pub const DEFAULT_SERVICE_NAME: &str = "Slow Platform";
pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

const ENV_SERVICE_NAME: &str = "APITEST_SERVICE_NAME";
const ENV_TIMEOUT_SECS: &str = "APITEST_TIMEOUT_SECS";
const ENV_USER_AGENT: &str = "APITEST_USER_AGENT";
const ENV_MAX_REDIRECTS: &str = "APITEST_MAX_REDIRECTS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub service_name: String,
    /// Per-request timeout applied when a caller does not supply one.
    pub default_timeout_secs: f64,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: concat!("apitest-engine/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl EngineConfig {
    /// Load defaults, then `path` when given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, EngineError> {
        if let Ok(env_file) = dotenvy::dotenv() {
            tracing::debug!(path = %env_file.display(), "loaded .env file");
        }

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let raw = fs::read_to_string(path).map_err(|source| EngineError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `APITEST_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup(ENV_SERVICE_NAME) {
            self.service_name = name;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.default_timeout_secs = raw.trim().parse().map_err(|err| {
                EngineError::Config(format!("{ENV_TIMEOUT_SECS} must be a number, got `{raw}`: {err}"))
            })?;
        }
        if let Some(agent) = lookup(ENV_USER_AGENT) {
            self.user_agent = agent;
        }
        if let Some(raw) = lookup(ENV_MAX_REDIRECTS) {
            self.max_redirects = raw.trim().parse().map_err(|err| {
                EngineError::Config(format!(
                    "{ENV_MAX_REDIRECTS} must be a non-negative integer, got `{raw}`: {err}"
                ))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.default_timeout_secs.is_finite() || self.default_timeout_secs <= 0.0 {
            return Err(EngineError::Config(format!(
                "default_timeout_secs must be positive, got {}",
                self.default_timeout_secs
            )));
        }
        Ok(())
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.default_timeout_secs)
    }
}
