//! MCP server error types.

use thiserror::Error;

/// Errors that end a served session.
///
/// Per-request problems are answered on the wire and never surface here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The host never completed the initialize handshake.
    #[error("MCP initialization failed: {0}")]
    Initialize(String),

    #[error("MCP session failed: {0}")]
    Session(String),
}

pub type Result<T> = std::result::Result<T, Error>;
