//! Room membership bookkeeping
//!
//! The registry is the only state shared across connection tasks. It knows
//! nothing about message content; it maps room ids to member sets and keeps
//! a reverse index for disconnect cleanup. None of its operations error:
//! absent rooms and absent memberships are routine under concurrent
//! disconnects, so they are defined as no-ops.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-wide map of room id -> member connection ids
pub struct RoomRegistry {
    /// Rooms and their current members. A room exists iff it has at least
    /// one member: created lazily on first join, removed on last leave.
    rooms: Arc<RwLock<HashMap<String, HashSet<String>>>>,
    /// Map of connection ID to set of room IDs it is in
    client_rooms: Arc<RwLock<HashMap<String, HashSet<String>>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            client_rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Add a connection to a room, creating the room if absent. Returns
    /// true if the connection was newly added; a duplicate join is a no-op.
    ///
    /// Both maps are mutated under both write locks so they cannot diverge.
    pub async fn join(&self, room_id: &str, conn_id: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        let mut client_rooms = self.client_rooms.write().await;

        let added = rooms
            .entry(room_id.to_string())
            .or_default()
            .insert(conn_id.to_string());

        client_rooms
            .entry(conn_id.to_string())
            .or_default()
            .insert(room_id.to_string());

        added
    }

    /// Remove a connection from a room. Returns true if the connection was
    /// actually a member. The room is dropped when its member set empties.
    pub async fn leave(&self, room_id: &str, conn_id: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        let mut client_rooms = self.client_rooms.write().await;

        let removed = match rooms.get_mut(room_id) {
            Some(members) => {
                let removed = members.remove(conn_id);
                if members.is_empty() {
                    rooms.remove(room_id);
                }
                removed
            }
            None => false,
        };

        if let Some(joined) = client_rooms.get_mut(conn_id) {
            joined.remove(room_id);
            if joined.is_empty() {
                client_rooms.remove(conn_id);
            }
        }

        removed
    }

    /// Remove a connection from every room it is in, returning the rooms it
    /// actually left. A second call for the same connection returns nothing,
    /// which is what makes teardown idempotent.
    pub async fn remove_connection(&self, conn_id: &str) -> Vec<String> {
        let mut rooms = self.rooms.write().await;
        let mut client_rooms = self.client_rooms.write().await;

        let joined = match client_rooms.remove(conn_id) {
            Some(joined) => joined,
            None => return Vec::new(),
        };

        let mut left = Vec::with_capacity(joined.len());
        for room_id in joined {
            if let Some(members) = rooms.get_mut(&room_id) {
                if members.remove(conn_id) {
                    if members.is_empty() {
                        rooms.remove(&room_id);
                    }
                    left.push(room_id);
                }
            }
        }

        left
    }

    /// Snapshot of a room's current members (empty if the room is absent).
    /// Callers iterate the snapshot outside the registry lock, so a
    /// concurrent join/leave can never invalidate the iteration.
    pub async fn members_of(&self, room_id: &str) -> Vec<String> {
        self.rooms
            .read()
            .await
            .get(room_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of the rooms a connection is currently in
    pub async fn rooms_of(&self, conn_id: &str) -> Vec<String> {
        self.client_rooms
            .read()
            .await
            .get(conn_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether a room currently exists (i.e. has at least one member)
    pub async fn contains_room(&self, room_id: &str) -> bool {
        self.rooms.read().await.contains_key(room_id)
    }

    /// Number of currently occupied rooms
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
