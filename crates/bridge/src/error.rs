//! Dispatch error types.

use thiserror::Error;

/// Errors a tool call can end in. All of them are reported in the envelope.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// One entry per offending field.
    #[error("invalid arguments: {}", .0.join("; "))]
    InvalidArguments(Vec<String>),

    #[error(transparent)]
    Crm(#[from] crm::Error),
}

impl Error {
    pub fn invalid(problem: impl Into<String>) -> Self {
        Self::InvalidArguments(vec![problem.into()])
    }
}

pub type Result<T> = std::result::Result<T, Error>;
