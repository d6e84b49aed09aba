use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::message::User;

/// Events the client emits to the server.
///
/// Serialized as a JSON envelope `{"event": NAME, "data": PAYLOAD}`, one
/// envelope per websocket text frame. Wire field spelling follows the
/// upstream service: camelCase for ids, snake_case inside the user object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Identify this user to the namespace. Must precede any `join_room`.
    InitUser(User),

    /// Open the user-scoped subscription on a namespace.
    Subscribe {
        #[serde(rename = "userId")]
        user_id: String,
    },

    /// Drop the user-scoped subscription.
    Unsubscribe {
        #[serde(rename = "userId")]
        user_id: String,
    },

    /// Enter a room. Only valid after `init_success` has been received.
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "userId")]
        user_id: String,
    },

    /// Leave a room. Fire-and-forget; no acknowledgement follows.
    LeaveRoom {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "userId")]
        user_id: String,
    },

    /// Outgoing chat message. The id is client-generated and the server
    /// echo carries the authoritative copy.
    NewMessage {
        id: String,
        content: String,
        #[serde(rename = "roomId")]
        room_id: String,
    },

    /// The local user started composing.
    TypingStart {
        #[serde(rename = "roomId")]
        room_id: String,
    },

    /// The local user went idle or sent the message.
    TypingEnd {
        #[serde(rename = "roomId")]
        room_id: String,
    },

    /// Request deletion of a message. Removal happens only on the
    /// `message_deleted` confirmation.
    DeleteMessage {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "messageId")]
        message_id: String,
    },
}

impl ClientEvent {
    /// Serialize to the wire envelope.
    pub fn to_wire_format(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ClientEvent;
    use crate::message::User;

    #[test]
    fn test_join_room_envelope() {
        let event = ClientEvent::JoinRoom {
            room_id: "r1".to_string(),
            user_id: "u1".to_string(),
        };

        let wire = event.to_wire_format().unwrap();
        let value: serde_json::Value = serde_json::from_str(&wire).unwrap();

        assert_eq!(
            value,
            json!({"event": "join_room", "data": {"roomId": "r1", "userId": "u1"}})
        );
    }

    #[test]
    fn test_init_user_payload_is_flat() {
        let event = ClientEvent::InitUser(User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Archer".to_string(),
        });

        let wire = event.to_wire_format().unwrap();
        let value: serde_json::Value = serde_json::from_str(&wire).unwrap();

        assert_eq!(value["event"], "init_user");
        assert_eq!(value["data"]["username"], "alice");
        assert_eq!(value["data"]["first_name"], "Alice");
    }

    #[test]
    fn test_round_trip() {
        let event = ClientEvent::DeleteMessage {
            room_id: "r1".to_string(),
            message_id: "m42".to_string(),
        };

        let wire = event.to_wire_format().unwrap();
        let parsed: ClientEvent = serde_json::from_str(&wire).unwrap();

        assert_eq!(parsed, event);
    }
}
