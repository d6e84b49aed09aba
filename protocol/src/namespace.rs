use std::fmt;

/// Logical sub-channels of the realtime transport.
///
/// Each namespace is served by its own persistent websocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Chat,
    Deal,
    Contract,
    Notification,
}

impl Namespace {
    /// Every namespace a logged-in user is bound to, in bind order.
    pub const ALL: [Namespace; 4] = [
        Namespace::Deal,
        Namespace::Notification,
        Namespace::Contract,
        Namespace::Chat,
    ];

    /// URL path of the namespace endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Chat => "/chat",
            Self::Deal => "/deal",
            Self::Contract => "/contract",
            Self::Notification => "/notification",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Chat => "chat",
            Self::Deal => "deal",
            Self::Contract => "contract",
            Self::Notification => "notification",
        };
        f.write_str(name)
    }
}
