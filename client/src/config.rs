use std::time::Duration;

use sponda_protocol::Namespace;

/// Connect and retry configuration applied to every namespace connection.
///
/// The transport is websocket-only; each reconnection episode gets a bounded
/// budget of automatic attempts, after which the connection stays in the
/// error state until the caller forces a reconnect.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base websocket URL, e.g. `wss://realtime.sponda.app`.
    pub base_url: String,
    /// Per-attempt websocket handshake timeout.
    pub handshake_timeout: Duration,
    /// Automatic connect attempts per episode.
    pub max_attempts: usize,
    /// Delay between attempts within an episode.
    pub attempt_delay: Duration,
    /// Delay before the single retry scheduled after the first handshake
    /// failure of an episode.
    pub error_retry_delay: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            handshake_timeout: Duration::from_secs(10),
            max_attempts: 5,
            attempt_delay: Duration::from_secs(1),
            error_retry_delay: Duration::from_secs(5),
        }
    }

    /// Endpoint URL for a namespace.
    pub fn url_for(&self, namespace: Namespace) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), namespace.path())
    }

    /// Delay before the next automatic attempt after `failed` consecutive
    /// handshake failures, or `None` once the episode budget is spent.
    pub fn retry_delay(&self, failed: usize) -> Option<Duration> {
        if failed >= self.max_attempts {
            None
        } else if failed == 1 {
            Some(self.error_retry_delay)
        } else {
            Some(self.attempt_delay)
        }
    }
}
