//! CRM client error types.

use thiserror::Error;

/// CRM client errors.
///
/// Every failure path of every operation ends in one of these variants, so
/// callers see the same message shape regardless of verb or entity.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The credential context cannot produce a usable client.
    #[error("invalid credentials: {0}")]
    Credentials(String),

    /// The CRM answered with a non-2xx status.
    #[error("CRM API error: {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response (DNS, refused, timeout, ...).
    #[error("CRM API error: {0}")]
    Transport(String),
}

impl Error {
    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
