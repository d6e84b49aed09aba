mod tests;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::ParseError;
use crate::message::Message;

/// Events the server pushes to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// The `init_user` identity was accepted; room joins may proceed.
    InitSuccess,

    /// Membership in a room is established.
    RoomJoined {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "activeUsers", default)]
        active_users: Vec<String>,
    },

    /// A message broadcast to the room, including the echo of our own sends.
    ReceiveMessage(Message),

    UserTyping {
        username: String,
    },

    UserStoppedTyping {
        username: String,
    },

    /// The server confirmed a deletion; only now is the local copy removed.
    MessageDeleted {
        #[serde(rename = "messageId")]
        message_id: String,
    },

    /// Protocol-level failure surfaced to the caller. Not retried.
    Error {
        message: String,
    },
}

/// Parse a websocket text frame into a server event.
pub fn parse_server_event(frame: &str) -> Result<ServerEvent> {
    let frame = frame.trim();

    if frame.is_empty() {
        return Err(ParseError::EmptyFrame.into());
    }

    serde_json::from_str(frame)
        .map_err(|e| ParseError::InvalidFormat(e.to_string()).into())
}
