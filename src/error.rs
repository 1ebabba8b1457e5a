use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum RelayError {
    // Message errors
    MessageParse(String),

    // Auth errors
    AuthError(String),
    Unauthorized,

    // Configuration errors
    ConfigError(String),
}

// Disconnects are expected events handled by teardown, and the room
// registry has no error kinds by design: operations on absent rooms or
// absent memberships are routine under concurrent disconnects and are
// treated as no-ops, never as failures.

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MessageParse(msg) => write!(f, "Message parse error: {}", msg),
            Self::AuthError(msg) => write!(f, "Authentication error: {}", msg),
            Self::Unauthorized => write!(f, "Unauthorized access"),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for RelayError {}

// Generic result type for the relay
pub type Result<T> = std::result::Result<T, RelayError>;
