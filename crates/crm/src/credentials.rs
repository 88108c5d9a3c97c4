//! Credential context shared by every request.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Base URL plus Basic-auth identity and secret.
///
/// Loaded once at startup and never mutated.
#[derive(Clone)]
pub struct Credentials {
    base_url: String,
    identity: String,
    secret: String,
}

impl Credentials {
    /// Trailing slashes on the base URL are dropped so entity paths can be
    /// appended directly.
    pub fn new(
        base_url: impl Into<String>,
        identity: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            identity: identity.into(),
            secret: secret.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Value for the `Authorization` header.
    pub fn basic_auth(&self) -> String {
        let encoded = STANDARD.encode(format!("{}:{}", self.identity, self.secret));
        format!("Basic {encoded}")
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_header() {
        let creds = Credentials::new("https://crm.example.com/api", "user", "pass");
        // base64("user:pass")
        assert_eq!(creds.basic_auth(), "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn trims_trailing_slash() {
        let creds = Credentials::new("https://crm.example.com/api//", "u", "p");
        assert_eq!(creds.base_url(), "https://crm.example.com/api");
    }

    #[test]
    fn debug_redacts_secret() {
        let creds = Credentials::new("https://crm.example.com", "u", "hunter2");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
