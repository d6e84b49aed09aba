use serde::{Deserialize, Serialize};

/// A user identity as carried by the realtime protocol.
///
/// This is both the `init_user` payload and the sender shape embedded in
/// broadcast messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// A chat message as broadcast by the server.
///
/// Messages are immutable once received; the only way one disappears is a
/// `message_deleted` confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub sender: User,
    #[serde(rename = "roomId", default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    pub timestamp: String,
}

/// One room row from the REST room listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
}
