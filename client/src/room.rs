use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Result, anyhow};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Duration, Instant};

use sponda_protocol::{ClientEvent, Message, ServerEvent, User};

use crate::connection::NamespaceHandle;

/// Idle period after the last keystroke before the typing indicator ends.
const TYPING_IDLE: Duration = Duration::from_millis(2000);

/// Join-handshake progress for one room.
///
/// `join_room` is gated behind `init_success`: the only path to emitting it
/// runs through `Initializing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No handshake in flight. Also the state a failed join falls back to.
    Uninitialized,
    /// `init_user` sent, waiting for `init_success`.
    Initializing,
    /// `join_room` sent, waiting for `room_joined`.
    Ready,
    /// Member of the room; sending is unblocked.
    Joined,
    /// `leave_room` sent; the channel is finished.
    Left,
}

/// Commands accepted by a running room channel.
#[derive(Debug)]
pub enum RoomCommand {
    /// Start the two-phase join handshake.
    Join,
    /// A keystroke in the message composer.
    Input,
    Send { content: String },
    Delete { message_id: String },
    Leave,
}

/// Events a room channel emits toward the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    Joined { active_users: Vec<String> },
    Message(Message),
    MessageDeleted { message_id: String },
    UserTyping { username: String },
    UserStoppedTyping { username: String },
    Error { message: String },
}

/// Cloneable handle for driving a spawned room channel.
#[derive(Clone)]
pub struct RoomHandle {
    commands: mpsc::UnboundedSender<RoomCommand>,
}

impl RoomHandle {
    pub fn join(&self) -> Result<()> {
        self.command(RoomCommand::Join)
    }

    /// Register a composer keystroke for the typing indicator.
    pub fn input(&self) -> Result<()> {
        self.command(RoomCommand::Input)
    }

    pub fn send(&self, content: impl Into<String>) -> Result<()> {
        self.command(RoomCommand::Send {
            content: content.into(),
        })
    }

    pub fn delete(&self, message_id: impl Into<String>) -> Result<()> {
        self.command(RoomCommand::Delete {
            message_id: message_id.into(),
        })
    }

    pub fn leave(&self) -> Result<()> {
        self.command(RoomCommand::Leave)
    }

    fn command(&self, command: RoomCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| anyhow!("room channel closed"))
    }
}

/// Per-room protocol driver: join/leave handshake, message send and delete,
/// typing debounce.
///
/// The transition methods are synchronous and side-effect only through the
/// outbound and event senders, so the whole protocol is testable without a
/// transport; [`RoomChannel::run`] drives them from a task.
pub struct RoomChannel {
    room_id: String,
    user: User,
    phase: Phase,
    joined_at: Option<Instant>,
    is_typing: bool,
    typing_deadline: Option<Instant>,
    seq: u64,
    outbound: mpsc::UnboundedSender<ClientEvent>,
    events: mpsc::UnboundedSender<RoomEvent>,
}

impl RoomChannel {
    pub fn new(
        room_id: impl Into<String>,
        user: User,
        outbound: mpsc::UnboundedSender<ClientEvent>,
        events: mpsc::UnboundedSender<RoomEvent>,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            user,
            phase: Phase::Uninitialized,
            joined_at: None,
            is_typing: false,
            typing_deadline: None,
            seq: 0,
            outbound,
            events,
        }
    }

    /// Spawn a channel on a namespace connection.
    ///
    /// Returns the command handle and the room-event stream. Dropping every
    /// handle leaves the room best-effort and stops the task.
    pub fn spawn(
        handle: &NamespaceHandle,
        room_id: impl Into<String>,
        user: User,
    ) -> (RoomHandle, mpsc::UnboundedReceiver<RoomEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let channel = RoomChannel::new(room_id, user, handle.sender(), events_tx);
        tokio::spawn(channel.run(commands_rx, handle.subscribe()));

        (
            RoomHandle {
                commands: commands_tx,
            },
            events_rx,
        )
    }

    /// Drive the channel until it leaves the room or loses its inputs.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<RoomCommand>,
        mut server: broadcast::Receiver<ServerEvent>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command, Instant::now()),
                    None => self.leave(),
                },
                event = server.recv() => match event {
                    Ok(event) => self.handle_server_event(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            room = %self.room_id,
                            skipped,
                            "room channel lagged behind connection events"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => self.leave(),
                },
                _ = wait_deadline(self.typing_deadline) => self.poll_typing(Instant::now()),
            }

            if self.phase == Phase::Left {
                return;
            }
        }
    }

    pub fn handle_command(&mut self, command: RoomCommand, now: Instant) {
        match command {
            RoomCommand::Join => self.join(),
            RoomCommand::Input => self.input(now),
            RoomCommand::Send { content } => self.send_message(&content),
            RoomCommand::Delete { message_id } => self.delete(&message_id),
            RoomCommand::Leave => self.leave(),
        }
    }

    /// Start the two-phase handshake. A channel that is already
    /// initializing, joined, or left ignores the call.
    pub fn join(&mut self) {
        if self.phase != Phase::Uninitialized {
            return;
        }
        self.emit(ClientEvent::InitUser(self.user.clone()));
        self.phase = Phase::Initializing;
    }

    pub fn handle_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::InitSuccess => {
                if self.phase == Phase::Initializing {
                    self.emit(ClientEvent::JoinRoom {
                        room_id: self.room_id.clone(),
                        user_id: self.user.id.clone(),
                    });
                    self.phase = Phase::Ready;
                }
            }
            ServerEvent::RoomJoined {
                room_id,
                active_users,
            } => {
                if room_id == self.room_id && self.phase == Phase::Ready {
                    self.phase = Phase::Joined;
                    self.joined_at = Some(Instant::now());
                    self.notify(RoomEvent::Joined { active_users });
                }
            }
            ServerEvent::ReceiveMessage(message) => {
                // The server echo is the authoritative copy; locally sent
                // messages surface here and nowhere earlier.
                self.notify(RoomEvent::Message(message));
            }
            ServerEvent::UserTyping { username } => {
                self.notify(RoomEvent::UserTyping { username });
            }
            ServerEvent::UserStoppedTyping { username } => {
                self.notify(RoomEvent::UserStoppedTyping { username });
            }
            ServerEvent::MessageDeleted { message_id } => {
                self.notify(RoomEvent::MessageDeleted { message_id });
            }
            ServerEvent::Error { message } => {
                if matches!(self.phase, Phase::Initializing | Phase::Ready) {
                    // A failed join is not retried; the caller must
                    // re-trigger it.
                    self.phase = Phase::Uninitialized;
                }
                self.notify(RoomEvent::Error { message });
            }
        }
    }

    /// Send a chat message. Outside `Joined`, or with effectively empty
    /// content, this is a no-op. The message is not appended locally; the
    /// server echo is what surfaces it.
    pub fn send_message(&mut self, content: &str) {
        let content = content.trim();
        if self.phase != Phase::Joined || content.is_empty() {
            return;
        }

        let id = self.next_message_id();
        self.emit(ClientEvent::NewMessage {
            id,
            content: content.to_string(),
            room_id: self.room_id.clone(),
        });
        self.stop_typing();
    }

    /// Request deletion. The local list is only filtered when the server
    /// confirms with `message_deleted`.
    pub fn delete(&mut self, message_id: &str) {
        if self.phase != Phase::Joined {
            return;
        }
        self.emit(ClientEvent::DeleteMessage {
            room_id: self.room_id.clone(),
            message_id: message_id.to_string(),
        });
    }

    /// Register a composer keystroke, starting or extending the typing
    /// indicator.
    pub fn input(&mut self, now: Instant) {
        if self.phase != Phase::Joined {
            return;
        }
        if !self.is_typing {
            self.is_typing = true;
            self.emit(ClientEvent::TypingStart {
                room_id: self.room_id.clone(),
            });
        }
        self.typing_deadline = Some(now + TYPING_IDLE);
    }

    /// Fire the typing idle deadline if it has elapsed.
    pub fn poll_typing(&mut self, now: Instant) {
        if let Some(deadline) = self.typing_deadline
            && now >= deadline
        {
            self.stop_typing();
        }
    }

    /// Leave the room and finish the channel. Fire-and-forget: no
    /// acknowledgement is awaited.
    pub fn leave(&mut self) {
        if self.phase == Phase::Left {
            return;
        }
        self.stop_typing();
        self.emit(ClientEvent::LeaveRoom {
            room_id: self.room_id.clone(),
            user_id: self.user.id.clone(),
        });
        self.phase = Phase::Left;
        self.joined_at = None;
    }

    pub fn is_joined(&self) -> bool {
        self.phase == Phase::Joined
    }

    /// When membership was established, if currently joined.
    pub fn joined_at(&self) -> Option<Instant> {
        self.joined_at
    }

    fn stop_typing(&mut self) {
        self.typing_deadline = None;
        if self.is_typing {
            self.is_typing = false;
            self.emit(ClientEvent::TypingEnd {
                room_id: self.room_id.clone(),
            });
        }
    }

    fn next_message_id(&mut self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        self.seq += 1;
        format!("{millis}-{}", self.seq)
    }

    fn emit(&self, event: ClientEvent) {
        if self.outbound.send(event).is_err() {
            tracing::debug!(room = %self.room_id, "connection gone, dropping outbound event");
        }
    }

    fn notify(&self, event: RoomEvent) {
        let _ = self.events.send(event);
    }
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
