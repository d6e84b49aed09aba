use std::collections::HashMap;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message as WsMessage,
};

use sponda_protocol::{ClientEvent, Namespace, ServerEvent, parse_server_event};

use crate::config::ClientConfig;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Connection lifecycle state, readable through [`NamespaceHandle::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// The connection task has shut down; nothing more can be queued on it.
#[derive(Debug, Error)]
#[error("connection closed")]
pub struct ConnectionClosed;

/// Cloneable handle to one supervised namespace connection.
///
/// Events queued while the connection is down are flushed after the next
/// successful connect; the handle itself never blocks.
#[derive(Clone)]
pub struct NamespaceHandle {
    namespace: Namespace,
    outbound: mpsc::UnboundedSender<ClientEvent>,
    events: broadcast::Sender<ServerEvent>,
    status: watch::Receiver<ConnectionStatus>,
    reconnect: mpsc::Sender<()>,
}

impl NamespaceHandle {
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Queue an event for the server.
    pub fn send(&self, event: ClientEvent) -> Result<(), ConnectionClosed> {
        self.outbound.send(event).map_err(|_| ConnectionClosed)
    }

    /// Subscribe to server events on this namespace.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Watch status transitions as they happen.
    pub fn status_stream(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Force a fresh connection attempt regardless of current state.
    pub fn reconnect(&self) {
        let _ = self.reconnect.try_send(());
    }

    pub(crate) fn sender(&self) -> mpsc::UnboundedSender<ClientEvent> {
        self.outbound.clone()
    }
}

/// Owns one supervised connection per namespace.
///
/// Connections live for the lifetime of the manager and reconnect in place;
/// logout never closes them. Dropping the manager tears every task down.
pub struct ConnectionManager {
    config: ClientConfig,
    connections: HashMap<Namespace, (NamespaceHandle, JoinHandle<()>)>,
}

impl ConnectionManager {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            connections: HashMap::new(),
        }
    }

    /// Open the connection for a namespace, spawning its supervisor task.
    ///
    /// Idempotent: a second call for the same namespace returns a handle to
    /// the existing connection.
    pub fn open(&mut self, namespace: Namespace) -> NamespaceHandle {
        if let Some((handle, _)) = self.connections.get(&namespace) {
            return handle.clone();
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
        let (reconnect_tx, reconnect_rx) = mpsc::channel(1);

        let handle = NamespaceHandle {
            namespace,
            outbound: outbound_tx,
            events: events_tx.clone(),
            status: status_rx,
            reconnect: reconnect_tx,
        };

        let task = ConnectionTask {
            namespace,
            url: self.config.url_for(namespace),
            config: self.config.clone(),
            status: status_tx,
            outbound: outbound_rx,
            events: events_tx,
            reconnect: reconnect_rx,
        };

        let join = tokio::spawn(task.run());
        self.connections.insert(namespace, (handle.clone(), join));
        handle
    }

    /// Handle to an already-open namespace connection.
    pub fn handle(&self, namespace: Namespace) -> Option<NamespaceHandle> {
        self.connections.get(&namespace).map(|(h, _)| h.clone())
    }

    pub fn status(&self, namespace: Namespace) -> ConnectionStatus {
        self.connections
            .get(&namespace)
            .map_or(ConnectionStatus::Disconnected, |(h, _)| h.status())
    }

    /// Force a new connection attempt for a namespace.
    pub fn reconnect(&self, namespace: Namespace) {
        if let Some((handle, _)) = self.connections.get(&namespace) {
            handle.reconnect();
        }
    }

    /// Tear down every connection task.
    pub fn shutdown(&mut self) {
        for (_, (_, join)) in self.connections.drain() {
            join.abort();
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

enum PumpExit {
    /// Transport dropped; start a fresh episode.
    Disconnected,
    /// A caller forced a reconnect.
    Forced,
    /// Every handle is gone; stop supervising.
    Closed,
}

enum EpisodeExit {
    Restart,
    Exhausted,
    Closed,
}

struct ConnectionTask {
    namespace: Namespace,
    url: String,
    config: ClientConfig,
    status: watch::Sender<ConnectionStatus>,
    outbound: mpsc::UnboundedReceiver<ClientEvent>,
    events: broadcast::Sender<ServerEvent>,
    reconnect: mpsc::Receiver<()>,
}

impl ConnectionTask {
    async fn run(mut self) {
        loop {
            match self.episode().await {
                EpisodeExit::Restart => continue,
                EpisodeExit::Closed => return,
                EpisodeExit::Exhausted => {
                    self.set_status(ConnectionStatus::Error);
                    tracing::warn!(
                        namespace = %self.namespace,
                        attempts = self.config.max_attempts,
                        "connection attempts exhausted, waiting for manual reconnect"
                    );
                    if self.reconnect.recv().await.is_none() {
                        return;
                    }
                }
            }
        }
    }

    /// One reconnection episode: a bounded series of connect attempts.
    async fn episode(&mut self) -> EpisodeExit {
        let mut failed = 0;

        loop {
            self.set_status(ConnectionStatus::Connecting);

            match tokio::time::timeout(self.config.handshake_timeout, connect_async(self.url.as_str()))
                .await
            {
                Ok(Ok((ws, _response))) => {
                    self.set_status(ConnectionStatus::Connected);
                    tracing::info!(namespace = %self.namespace, "connected");

                    match self.pump(ws).await {
                        PumpExit::Disconnected => {
                            self.set_status(ConnectionStatus::Disconnected);
                            tracing::warn!(
                                namespace = %self.namespace,
                                "transport disconnected, reconnecting"
                            );
                            return EpisodeExit::Restart;
                        }
                        PumpExit::Forced => {
                            self.set_status(ConnectionStatus::Disconnected);
                            return EpisodeExit::Restart;
                        }
                        PumpExit::Closed => return EpisodeExit::Closed,
                    }
                }
                Ok(Err(e)) => {
                    failed += 1;
                    self.set_status(ConnectionStatus::Error);
                    tracing::warn!(
                        namespace = %self.namespace,
                        attempt = failed,
                        error = %e,
                        "handshake failed"
                    );
                }
                Err(_) => {
                    failed += 1;
                    self.set_status(ConnectionStatus::Error);
                    tracing::warn!(
                        namespace = %self.namespace,
                        attempt = failed,
                        timeout = ?self.config.handshake_timeout,
                        "handshake timed out"
                    );
                }
            }

            match self.config.retry_delay(failed) {
                Some(delay) => {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        forced = self.reconnect.recv() => {
                            return match forced {
                                Some(()) => EpisodeExit::Restart,
                                None => EpisodeExit::Closed,
                            };
                        }
                    }
                }
                None => return EpisodeExit::Exhausted,
            }
        }
    }

    /// Relay traffic on an established socket until it drops or a caller
    /// forces a reconnect.
    async fn pump(&mut self, mut ws: WsStream) -> PumpExit {
        loop {
            tokio::select! {
                event = self.outbound.recv() => match event {
                    Some(event) => {
                        let frame = match event.to_wire_format() {
                            Ok(frame) => frame,
                            Err(e) => {
                                tracing::error!(
                                    namespace = %self.namespace,
                                    error = %e,
                                    "failed to serialize outbound event"
                                );
                                continue;
                            }
                        };
                        if ws.send(WsMessage::Text(frame)).await.is_err() {
                            return PumpExit::Disconnected;
                        }
                    }
                    None => {
                        let _ = ws.close(None).await;
                        return PumpExit::Closed;
                    }
                },
                forced = self.reconnect.recv() => {
                    let _ = ws.close(None).await;
                    return match forced {
                        Some(()) => PumpExit::Forced,
                        None => PumpExit::Closed,
                    };
                }
                frame = ws.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => match parse_server_event(&text) {
                        Ok(event) => {
                            let _ = self.events.send(event);
                        }
                        Err(e) => {
                            tracing::debug!(
                                namespace = %self.namespace,
                                error = %e,
                                "ignoring unparseable frame"
                            );
                        }
                    },
                    Some(Ok(WsMessage::Ping(data))) => {
                        if ws.send(WsMessage::Pong(data)).await.is_err() {
                            return PumpExit::Disconnected;
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => return PumpExit::Disconnected,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!(namespace = %self.namespace, error = %e, "websocket error");
                        return PumpExit::Disconnected;
                    }
                },
            }
        }
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.status.send_replace(status);
    }
}
