use std::env;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use sponda_client::{
    ChatHandler, ChatViewModel, ClientConfig, ConnectionManager, Message, Namespace, RoomChannel,
    Session, SessionBinder, User, run_events,
};

struct Printer;

impl ChatHandler for Printer {
    async fn on_joined(&mut self, active_users: &[String]) {
        println!("Joined ({} active)", active_users.len());
    }

    async fn on_message(&mut self, message: &Message) {
        let time = ChatViewModel::display_time(message);
        println!("[{}] {}: {}", time, message.sender.username, message.content);
    }

    async fn on_message_deleted(&mut self, message_id: &str) {
        println!("(message {message_id} deleted)");
    }

    async fn on_user_typing(&mut self, username: &str) {
        println!("{username} is typing...");
    }

    async fn on_error(&mut self, message: &str) {
        println!("Server error: {message}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let base_url =
        env::var("SPONDA_REALTIME_URL").unwrap_or_else(|_| "ws://localhost:4000".to_string());
    let room_id = env::args().nth(1).unwrap_or_else(|| "demo".to_string());

    let user = User {
        id: "demo-user".to_string(),
        username: "demo".to_string(),
        first_name: "Demo".to_string(),
        last_name: "Account".to_string(),
    };

    println!("Connecting to {base_url}...");
    let mut manager = ConnectionManager::new(ClientConfig::new(base_url));
    let mut binder = SessionBinder::new(&mut manager);
    binder.establish(Session {
        user_id: user.id.clone(),
        token: "demo-token".to_string(),
    });
    binder.track_room(room_id.clone());

    let chat = manager.open(Namespace::Chat);
    let (room, events) = RoomChannel::spawn(&chat, room_id.clone(), user);
    room.join()?;

    // Forward stdin lines as chat messages.
    let input_room = room.clone();
    tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();

        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if line == "/quit" {
                let _ = input_room.leave();
                break;
            }
            if line.is_empty() {
                continue;
            }
            let _ = input_room.input();
            let _ = input_room.send(line);
        }

        std::process::exit(0);
    });

    println!("Type to chat in '{room_id}', /quit to exit.");
    let mut printer = Printer;
    run_events(events, &mut printer).await;
    Ok(())
}
