//! Configuration loading from the environment and crm-bridge.toml.

use std::path::Path;

use crm::Credentials;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "crm-bridge.toml";

pub const ENV_API_URL: &str = "CRM_API_URL";
pub const ENV_API_USER: &str = "CRM_API_USER";
pub const ENV_API_SECRET: &str = "CRM_API_SECRET";

/// Optional file settings. Credentials are never read from disk.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Base URL of the CRM API.
    pub api_url: Option<String>,
}

impl FileConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Resolved startup configuration.
#[derive(Debug)]
pub struct Config {
    pub credentials: Credentials,
}

impl Config {
    /// Load from `path` (or `crm-bridge.toml` if present) and the process
    /// environment. Environment values win over the file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => FileConfig::load(path)?,
            None if Path::new(CONFIG_FILE).exists() => FileConfig::load(CONFIG_FILE)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Combine file settings with values from `env`.
    ///
    /// Blank values count as unset.
    pub fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let api_url = var(ENV_API_URL)
            .or(file.api_url.filter(|v| !v.trim().is_empty()))
            .ok_or(ConfigError::Missing(ENV_API_URL))?;
        let user = var(ENV_API_USER).ok_or(ConfigError::Missing(ENV_API_USER))?;
        let secret = var(ENV_API_SECRET).ok_or(ConfigError::Missing(ENV_API_SECRET))?;

        Ok(Self {
            credentials: Credentials::new(api_url.trim(), user, secret),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("{0} is not set")]
    Missing(&'static str),
}
