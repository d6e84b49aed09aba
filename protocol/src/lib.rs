use thiserror::Error;

pub mod client;
pub mod message;
pub mod namespace;
pub mod server;

pub use client::ClientEvent;
pub use message::{Message, RoomSummary, User};
pub use namespace::Namespace;
pub use server::{ServerEvent, parse_server_event};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid event format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Empty frame")]
    EmptyFrame,
}
