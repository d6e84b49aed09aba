use std::collections::{BTreeSet, HashMap, HashSet};

use tokio::sync::mpsc;

use sponda_protocol::{ClientEvent, Namespace};

use crate::connection::ConnectionManager;

/// Authenticated session, sourced from the platform token store.
///
/// Exists only between login and logout; the connections it binds outlive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub token: String,
}

/// Binds user-scoped subscriptions and room membership to the
/// authentication lifecycle.
///
/// Both login triggers (token loaded, profile fetched) funnel into the same
/// idempotent bind, so firing twice never duplicates a subscription. Logout
/// unwinds memberships fire-and-forget and leaves the connections open for
/// the next login.
pub struct SessionBinder {
    senders: HashMap<Namespace, mpsc::UnboundedSender<ClientEvent>>,
    session: Option<Session>,
    bound: HashSet<Namespace>,
    rooms: BTreeSet<String>,
}

impl SessionBinder {
    /// Open (or reuse) every namespace connection on the manager and bind
    /// future sessions to them.
    pub fn new(manager: &mut ConnectionManager) -> Self {
        let mut senders = HashMap::new();
        for namespace in Namespace::ALL {
            let handle = manager.open(namespace);
            senders.insert(namespace, handle.sender());
        }
        Self::with_senders(senders)
    }

    pub(crate) fn with_senders(
        senders: HashMap<Namespace, mpsc::UnboundedSender<ClientEvent>>,
    ) -> Self {
        Self {
            senders,
            session: None,
            bound: HashSet::new(),
            rooms: BTreeSet::new(),
        }
    }

    /// The token was loaded from the store: start a session and subscribe.
    pub fn establish(&mut self, session: Session) {
        let switched = self.session.as_ref().is_some_and(|current| *current != session);
        if switched {
            // A different user logged in without an intervening logout.
            self.logout();
        }
        self.session = Some(session);
        self.bind();
    }

    /// The profile fetch completed: re-assert the bindings. Safe to call any
    /// number of times, before or after [`SessionBinder::establish`].
    pub fn profile_fetched(&mut self) {
        self.bind();
    }

    fn bind(&mut self) {
        let Some(session) = &self.session else {
            return;
        };

        for namespace in Namespace::ALL {
            if self.bound.contains(&namespace) {
                continue;
            }
            if let Some(sender) = self.senders.get(&namespace) {
                let _ = sender.send(ClientEvent::Subscribe {
                    user_id: session.user_id.clone(),
                });
                self.bound.insert(namespace);
                tracing::debug!(namespace = %namespace, user = %session.user_id, "subscribed");
            }
        }
    }

    /// Track an active chat room so logout can leave it.
    pub fn track_room(&mut self, room_id: impl Into<String>) {
        self.rooms.insert(room_id.into());
    }

    pub fn untrack_room(&mut self, room_id: &str) {
        self.rooms.remove(room_id);
    }

    /// End the session: leave tracked rooms, unsubscribe everywhere, then
    /// clear the local session. Fire-and-forget, and the connections stay
    /// open for the next login.
    pub fn logout(&mut self) {
        let Some(session) = self.session.clone() else {
            return;
        };

        if let Some(chat) = self.senders.get(&Namespace::Chat) {
            for room_id in &self.rooms {
                let _ = chat.send(ClientEvent::LeaveRoom {
                    room_id: room_id.clone(),
                    user_id: session.user_id.clone(),
                });
            }
        }

        for namespace in Namespace::ALL {
            if !self.bound.contains(&namespace) {
                continue;
            }
            if let Some(sender) = self.senders.get(&namespace) {
                let _ = sender.send(ClientEvent::Unsubscribe {
                    user_id: session.user_id.clone(),
                });
            }
        }

        self.rooms.clear();
        self.bound.clear();
        self.session = None;
        tracing::info!(user = %session.user_id, "session ended");
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_bound(&self, namespace: Namespace) -> bool {
        self.bound.contains(&namespace)
    }
}
