//! Credential verification for connecting peers
//!
//! Issuance lives in the external identity provider; the relay only
//! validates the opaque bearer credential it is handed at connect time.

pub mod token;

// Re-export main components
pub use token::{Claims, TokenManager};
