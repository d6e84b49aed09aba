use std::collections::BTreeSet;

use sponda_protocol::Message;

use crate::room::RoomEvent;

/// Render-ready state for one chat room, derived purely from room events.
///
/// Messages are kept in arrival order and only ever appended by the server
/// echo; deletion happens only on server confirmation.
#[derive(Debug, Default)]
pub struct ChatViewModel {
    messages: Vec<Message>,
    typing: BTreeSet<String>,
    active_users: Vec<String>,
    last_error: Option<String>,
}

impl ChatViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one room event into the view state.
    pub fn apply(&mut self, event: &RoomEvent) {
        match event {
            RoomEvent::Joined { active_users } => {
                self.active_users = active_users.clone();
                // A (re)join starts from a clean set of indicators; peers
                // that dropped uncleanly would otherwise stick forever.
                self.typing.clear();
            }
            RoomEvent::Message(message) => self.messages.push(message.clone()),
            RoomEvent::MessageDeleted { message_id } => {
                self.messages.retain(|m| m.id != *message_id);
            }
            RoomEvent::UserTyping { username } => {
                self.typing.insert(username.clone());
            }
            RoomEvent::UserStoppedTyping { username } => {
                self.typing.remove(username);
            }
            RoomEvent::Error { message } => self.last_error = Some(message.clone()),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn typing(&self) -> &BTreeSet<String> {
        &self.typing
    }

    pub fn active_users(&self) -> &[String] {
        &self.active_users
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Wall-clock label for a message, or an empty string when the
    /// timestamp does not parse.
    pub fn display_time(message: &Message) -> String {
        chrono::DateTime::parse_from_rfc3339(&message.timestamp)
            .map(|dt| dt.format("%H:%M").to_string())
            .unwrap_or_default()
    }
}
