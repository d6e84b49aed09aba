mod api;
mod chat;
mod config;
mod connection;
mod handler;
pub mod room;
mod session;

pub use sponda_protocol::{ClientEvent, Message, Namespace, RoomSummary, ServerEvent, User};

pub use api::ApiClient;
pub use chat::ChatViewModel;
pub use config::ClientConfig;
pub use connection::{ConnectionClosed, ConnectionManager, ConnectionStatus, NamespaceHandle};
pub use handler::{ChatHandler, run_events};
pub use room::{RoomChannel, RoomCommand, RoomEvent, RoomHandle};
pub use session::{Session, SessionBinder};
