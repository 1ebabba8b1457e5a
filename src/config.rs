//! Server configuration module
//! Handles dynamic configuration parameters for the signaling relay

use crate::constants::{DEFAULT_HOST, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_PORT};
use crate::error::{RelayError, Result};
use std::env;

/// Relay configuration parameters
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Maximum size of a single inbound WebSocket frame in bytes
    pub max_message_size: usize,
    /// HMAC secret for verifying bearer credentials issued by the external
    /// identity provider. When unset, connections are accepted without a
    /// credential check.
    pub jwt_secret: Option<String>,
}

impl RelayConfig {
    /// Create a test configuration - only for testing!
    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            jwt_secret: None,
        }
    }

    /// Validate that a configured secret meets minimum requirements
    fn validate_secret(secret: &str) -> Result<()> {
        if secret.len() < 32 {
            return Err(RelayError::ConfigError(
                "JWT secret must be at least 32 characters long. \
                 Generate one with: openssl rand -base64 32"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from environment variables if available
    pub fn from_env() -> Result<Self> {
        let host = env::var("SIGNAL_RELAY_HOST").unwrap_or(DEFAULT_HOST.to_string());
        let port = env::var("SIGNAL_RELAY_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let max_message_size = env::var("SIGNAL_RELAY_MAX_MESSAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_MESSAGE_SIZE);

        // Credential verification is opt-in: enabled iff a secret is set.
        let jwt_secret = env::var("SIGNAL_RELAY_JWT_SECRET")
            .or_else(|_| env::var("JWT_SECRET"))
            .ok();

        if let Some(ref secret) = jwt_secret {
            Self::validate_secret(secret)?;
        }

        Ok(Self {
            host,
            port,
            max_message_size,
            jwt_secret,
        })
    }

    /// Whether connections must present a valid credential
    pub fn requires_auth(&self) -> bool {
        self.jwt_secret.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_testing_has_no_auth() {
        let config = RelayConfig::for_testing();
        assert!(!config.requires_auth());
        assert_eq!(config.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
    }

    #[test]
    fn test_short_secret_rejected() {
        let result = RelayConfig::validate_secret("too-short");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("at least 32 characters"));
    }

    #[test]
    fn test_long_secret_accepted() {
        assert!(RelayConfig::validate_secret(
            "0123456789abcdef0123456789abcdef-plenty-long"
        )
        .is_ok());
    }
}
