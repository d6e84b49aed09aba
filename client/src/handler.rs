use tokio::sync::mpsc;

use sponda_protocol::Message;

use crate::room::RoomEvent;

/// Trait for consuming room events.
///
/// Implement this to react to chat traffic. All methods have default no-op
/// implementations, so you only need to implement the events you care
/// about.
///
/// # Example
///
/// ```ignore
/// struct Logger;
///
/// impl ChatHandler for Logger {
///     async fn on_message(&mut self, message: &Message) {
///         println!("{}: {}", message.sender.username, message.content);
///     }
/// }
/// ```
#[allow(async_fn_in_trait)]
pub trait ChatHandler: Send {
    /// Called when room membership is established.
    async fn on_joined(&mut self, active_users: &[String]) {
        let _ = active_users;
    }

    /// Called for every message the server broadcasts, including the echo
    /// of our own sends.
    async fn on_message(&mut self, message: &Message) {
        let _ = message;
    }

    /// Called when the server confirms a deletion.
    async fn on_message_deleted(&mut self, message_id: &str) {
        let _ = message_id;
    }

    async fn on_user_typing(&mut self, username: &str) {
        let _ = username;
    }

    async fn on_user_stopped_typing(&mut self, username: &str) {
        let _ = username;
    }

    /// Called once per server-reported error. Nothing is retried.
    async fn on_error(&mut self, message: &str) {
        let _ = message;
    }
}

/// Drain room events into a handler until the channel closes.
pub async fn run_events<H: ChatHandler>(
    mut events: mpsc::UnboundedReceiver<RoomEvent>,
    handler: &mut H,
) {
    while let Some(event) = events.recv().await {
        dispatch(handler, &event).await;
    }
}

async fn dispatch<H: ChatHandler>(handler: &mut H, event: &RoomEvent) {
    match event {
        RoomEvent::Joined { active_users } => handler.on_joined(active_users).await,
        RoomEvent::Message(message) => handler.on_message(message).await,
        RoomEvent::MessageDeleted { message_id } => handler.on_message_deleted(message_id).await,
        RoomEvent::UserTyping { username } => handler.on_user_typing(username).await,
        RoomEvent::UserStoppedTyping { username } => {
            handler.on_user_stopped_typing(username).await;
        }
        RoomEvent::Error { message } => handler.on_error(message).await,
    }
}
