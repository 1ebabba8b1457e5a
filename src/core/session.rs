use std::collections::HashMap;
use tokio::sync::mpsc;
use warp::ws::Message as WsMessage;

use crate::core::connection::Connection;

// Manages live peer connections. The room registry tracks connection ids
// only; this table is where an id resolves to an actual sender.
pub struct SessionManager {
    connections: HashMap<String, Connection>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    // Register a new peer connection
    pub fn register(&mut self, connection: Connection) {
        self.connections.insert(connection.id.clone(), connection);
    }

    // Remove a peer connection, returning it if it was present
    pub fn unregister(&mut self, id: &str) -> Option<Connection> {
        self.connections.remove(id)
    }

    // Clone the outbound sender for a peer, if still connected
    pub fn sender(&self, id: &str) -> Option<mpsc::UnboundedSender<WsMessage>> {
        self.connections.get(id).map(|conn| conn.sender.clone())
    }

    // Get current peer count
    pub fn client_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
