//! Core functionality for the signaling relay

pub mod connection;
pub mod message;
pub mod room;
pub mod server;
pub mod session;

// Re-export main components for convenience
pub use connection::{Connection, ConnectionState};
pub use message::{ClientAction, ServerEvent};
pub use room::RoomRegistry;
pub use server::{RelayServer, SharedRelay};
pub use session::SessionManager;
