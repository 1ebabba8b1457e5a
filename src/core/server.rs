//! Integrated relay service that coordinates sessions and rooms
//!
//! `RelayServer` is the object injected into every connection's handling
//! context. It owns the session table and the room registry and implements
//! the join/leave/data/teardown operations plus the best-effort broadcaster.

use std::sync::Arc;
use log::{debug, warn};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::core::connection::Connection;
use crate::core::message::ServerEvent;
use crate::core::room::RoomRegistry;
use crate::core::session::SessionManager;

pub struct RelayServer {
    sessions: Arc<RwLock<SessionManager>>,
    rooms: RoomRegistry,
}

impl RelayServer {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(SessionManager::new())),
            rooms: RoomRegistry::new(),
        }
    }

    /// Register a freshly accepted connection
    pub async fn register(&self, connection: Connection) {
        let mut sessions = self.sessions.write().await;
        sessions.register(connection);
    }

    /// Add a peer to a room and announce it to the other members. The
    /// announcement happens after the registry mutation, so it reflects
    /// up-to-date membership; a duplicate join is not re-announced.
    pub async fn join_room(&self, conn_id: &str, room_id: &str) {
        if self.rooms.join(room_id, conn_id).await {
            let delivered = self
                .broadcast_to_room(room_id, &ServerEvent::joined(), Some(conn_id))
                .await;
            debug!(
                "{} joined room {} ({} peers notified)",
                conn_id, room_id, delivered
            );
        } else {
            debug!("{} re-joined room {} (ignored)", conn_id, room_id);
        }
    }

    /// Remove a peer from a room and notify the remaining members. Leaving
    /// a room one is not in is a no-op.
    pub async fn leave_room(&self, conn_id: &str, room_id: &str) {
        if self.rooms.leave(room_id, conn_id).await {
            let delivered = self
                .broadcast_to_room(room_id, &ServerEvent::left(), Some(conn_id))
                .await;
            debug!(
                "{} left room {} ({} peers notified)",
                conn_id, room_id, delivered
            );
        }
    }

    /// Relay an opaque payload to the other members of a room. A `data`
    /// message never creates a room; targeting an absent room delivers to
    /// nobody and is not an error.
    pub async fn relay_data(&self, conn_id: &str, room_id: &str, data: Value) {
        let delivered = self
            .broadcast_to_room(room_id, &ServerEvent::data(data), Some(conn_id))
            .await;
        debug!(
            "relayed data from {} to {} peers in room {}",
            conn_id, delivered, room_id
        );
    }

    /// Tear down a connection: drop it from the session table, remove it
    /// from every room it was in, and send one leave notice per vacated
    /// room. Safe to call more than once; only the first call notifies.
    pub async fn teardown(&self, conn_id: &str) {
        let was_open = {
            let mut sessions = self.sessions.write().await;
            match sessions.unregister(conn_id) {
                Some(mut connection) => connection.close(),
                None => false,
            }
        };
        if !was_open {
            return;
        }

        for room_id in self.rooms.remove_connection(conn_id).await {
            let delivered = self
                .broadcast_to_room(&room_id, &ServerEvent::left(), Some(conn_id))
                .await;
            debug!(
                "{} disconnected from room {} ({} peers notified)",
                conn_id, room_id, delivered
            );
        }
    }

    /// Best-effort fanout of one event to a room's members, minus the
    /// excluded sender. Membership is snapshotted first and the registry
    /// lock released before any send is issued, so a slow peer can never
    /// stall joins and leaves. A failed delivery is logged and skipped;
    /// the stale member is cleaned up by its own handler's teardown, never
    /// here. Returns the number of successful deliveries.
    pub async fn broadcast_to_room(
        &self,
        room_id: &str,
        event: &ServerEvent,
        exclude: Option<&str>,
    ) -> usize {
        let members = self.rooms.members_of(room_id).await;
        if members.is_empty() {
            return 0;
        }

        let text = match serde_json::to_string(event) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to serialize event for room {}: {}", room_id, e);
                return 0;
            }
        };

        let sessions = self.sessions.read().await;
        let mut delivered = 0;
        for member_id in members {
            if exclude == Some(member_id.as_str()) {
                continue;
            }

            // Sends go through unbounded channels and never block; a send
            // only fails once the member's writer task has already gone away.
            match sessions.sender(&member_id) {
                Some(sender) => {
                    if sender.send(warp::ws::Message::text(text.clone())).is_ok() {
                        delivered += 1;
                    } else {
                        warn!(
                            "Failed to deliver to {} in room {}, peer vanished mid-broadcast",
                            member_id, room_id
                        );
                    }
                }
                None => {
                    debug!(
                        "Skipping {} in room {}: no live session",
                        member_id, room_id
                    );
                }
            }
        }

        delivered
    }

    /// Snapshot of a room's current members
    pub async fn room_members(&self, room_id: &str) -> Vec<String> {
        self.rooms.members_of(room_id).await
    }

    /// Whether a room currently exists
    pub async fn has_room(&self, room_id: &str) -> bool {
        self.rooms.contains_room(room_id).await
    }

    /// Number of currently occupied rooms
    pub async fn room_count(&self) -> usize {
        self.rooms.room_count().await
    }

    /// Get connection count
    pub async fn connection_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.client_count()
    }
}

impl Default for RelayServer {
    fn default() -> Self {
        Self::new()
    }
}

// Shared reference to the relay
pub type SharedRelay = Arc<RelayServer>;
