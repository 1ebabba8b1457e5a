//! Signal Relay - a lightweight WebRTC signaling server implemented in Rust
//!
//! Peers connect over a WebSocket, join named rooms, and exchange opaque
//! signaling payloads (offers, answers, ICE candidates) which the relay
//! fans out to the other members of the room.

pub mod auth;
pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod handlers;

// Re-export main components
pub use config::*;
pub use constants::*;
