//! Request handlers for the relay endpoints

pub mod auth;
pub mod websocket;

// Re-export the websocket entry points
pub use websocket::{handle_ws_client, relay_routes};
