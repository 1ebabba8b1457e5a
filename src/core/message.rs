//! Wire protocol for the signaling relay
//!
//! Inbound frames are decoded once at the boundary into a [`ClientAction`];
//! anything that does not name a known action and a non-empty room maps to
//! [`ClientAction::Unrecognized`], which the dispatcher treats as a no-op.
//! The relay never inspects the `data` payload itself.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RelayError, Result};

/// Notice broadcast to a room when a peer joins.
pub const JOIN_NOTICE: &str = "A user has joined the room.";
/// Notice broadcast to a room when a peer leaves or disconnects.
pub const LEAVE_NOTICE: &str = "A user has left the room";

/// Raw shape of an inbound frame, before action dispatch
#[derive(Debug, Deserialize)]
struct RawMessage {
    action: Option<String>,
    room: Option<String>,
    data: Option<Value>,
}

/// A decoded client request
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAction {
    /// Enter a room, creating it if it does not exist yet
    Join { room: String },
    /// Leave a room
    Leave { room: String },
    /// Relay an opaque payload to the other members of a room
    Data { room: String, data: Value },
    /// Unknown action or missing/empty room; handled as a no-op
    Unrecognized,
}

impl ClientAction {
    /// Decode a text frame. Malformed JSON is an error (the frame is
    /// dropped by the caller); a well-formed object that doesn't match any
    /// known action decodes to `Unrecognized`.
    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawMessage = serde_json::from_str(text)
            .map_err(|e| RelayError::MessageParse(e.to_string()))?;

        let room = match raw.room {
            Some(room) if !room.is_empty() => room,
            _ => return Ok(ClientAction::Unrecognized),
        };

        Ok(match raw.action.as_deref() {
            Some("join") => ClientAction::Join { room },
            Some("leave") => ClientAction::Leave { room },
            Some("data") => ClientAction::Data {
                room,
                data: raw.data.unwrap_or(Value::Null),
            },
            _ => ClientAction::Unrecognized,
        })
    }
}

/// Server-originated events fanned out to room members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "join")]
    Join { message: String },

    #[serde(rename = "data")]
    Data { data: Value },

    #[serde(rename = "leave")]
    Leave { message: String },
}

impl ServerEvent {
    pub fn joined() -> Self {
        ServerEvent::Join {
            message: JOIN_NOTICE.to_string(),
        }
    }

    pub fn left() -> Self {
        ServerEvent::Leave {
            message: LEAVE_NOTICE.to_string(),
        }
    }

    pub fn data(data: Value) -> Self {
        ServerEvent::Data { data }
    }
}
