//! CLI error types.

use thiserror::Error;

use crate::config::ConfigError;

/// Startup and serve-loop errors. Any of these ends the process.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or missing required values.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The CRM client could not be built from the configuration.
    #[error(transparent)]
    Crm(#[from] crm::Error),

    /// The MCP session ended abnormally.
    #[error(transparent)]
    Mcp(#[from] mcp::Error),

    /// Failed to render the tool catalog.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
