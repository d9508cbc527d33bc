//! Token signing configuration.

/// Configuration for token signing and verification.
///
/// Secrets are ordered: the first signs new tokens and every entry is
/// accepted during verification. Rotation adds the new secret at the
/// front and keeps the old one listed until outstanding tokens expire.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    secrets: Vec<String>,
    /// Default token lifetime in seconds (default: 300 = 5 minutes).
    pub default_ttl_secs: u64,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secrets: vec![secret.into()],
            default_ttl_secs: 300,
        }
    }

    /// Keep accepting `secret` for verification without signing with it.
    pub fn with_previous(mut self, secret: impl Into<String>) -> Self {
        self.secrets.push(secret.into());
        self
    }

    pub fn with_default_ttl(mut self, ttl_secs: u64) -> Self {
        self.default_ttl_secs = ttl_secs;
        self
    }

    /// The secret new tokens are signed with.
    pub fn signing_secret(&self) -> &str {
        &self.secrets[0]
    }

    /// All secrets accepted during verification, signing secret first.
    pub fn secrets(&self) -> &[String] {
        &self.secrets
    }
}
