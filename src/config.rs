use crate::error::{IgnExtractError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tool settings, loaded from an optional TOML file and merged with CLI flags.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub fetch: FetchSettings,
    pub extract: ExtractSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Per-request timeout in seconds.
    pub timeout: u64,
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractSettings {
    /// Exit with a distinct status when any file entry failed.
    pub strict: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: 30,
            retries: 3,
            retry_delay_ms: 500,
            user_agent: format!("ign-extract/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchSettings {
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

pub const DEFAULT_SETTINGS_PATHS: &[&str] = &["ign-extract.toml", ".ign-extract.toml"];

impl Settings {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(IgnExtractError::Config {
                message: format!("Settings file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| IgnExtractError::Config {
            message: format!("Failed to read settings file {}: {}", path.display(), e),
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| IgnExtractError::Config {
            message: format!("Failed to parse settings file {}: {}", path.display(), e),
        })?;

        tracing::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(settings_path: Option<P>) -> Result<Self> {
        match settings_path {
            Some(path) => Self::load_from_file(path),
            None => {
                for default_path in DEFAULT_SETTINGS_PATHS {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, overrides: &CliOverrides) {
        if let Some(timeout) = overrides.timeout {
            self.fetch.timeout = timeout;
        }

        if let Some(retries) = overrides.retries {
            self.fetch.retries = retries;
        }

        if overrides.strict {
            self.extract.strict = true;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch.timeout == 0 {
            return Err(IgnExtractError::Config {
                message: "Fetch timeout must be greater than 0".to_string(),
            });
        }

        if self.fetch.user_agent.trim().is_empty() {
            return Err(IgnExtractError::Config {
                message: "User agent must not be empty".to_string(),
            });
        }

        if self.fetch.retries > 10 {
            return Err(IgnExtractError::Config {
                message: format!("At most 10 retries are allowed, got {}", self.fetch.retries),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub timeout: Option<u64>,
    pub retries: Option<u32>,
    pub strict: bool,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Option<u64>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: Option<u32>) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}
