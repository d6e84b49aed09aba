//! Reconnection policy tests against an in-process listener.

use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

use sponda_client::{ClientConfig, ConnectionManager, ConnectionStatus, Namespace, NamespaceHandle};

fn fast_config(addr: std::net::SocketAddr) -> ClientConfig {
    let mut config = ClientConfig::new(format!("ws://{addr}"));
    config.attempt_delay = Duration::from_millis(20);
    config.error_retry_delay = Duration::from_millis(20);
    config
}

async fn wait_for_status(handle: &NamespaceHandle, want: ConnectionStatus) {
    let mut status = handle.status_stream();
    timeout(Duration::from_secs(5), async {
        loop {
            if *status.borrow_and_update() == want {
                return;
            }
            status.changed().await.expect("status channel closed");
        }
    })
    .await
    .expect("timed out waiting for connection status");
}

#[tokio::test]
async fn transport_drop_reconnects_in_place() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (accepts_tx, mut accepts_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        // First connection completes the handshake, then drops.
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        accepts_tx.send(()).unwrap();
        drop(ws);

        // Second connection stays up.
        let (stream, _) = listener.accept().await.unwrap();
        let _ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        accepts_tx.send(()).unwrap();
        std::future::pending::<()>().await;
    });

    let mut manager = ConnectionManager::new(fast_config(addr));
    let handle = manager.open(Namespace::Deal);

    timeout(Duration::from_secs(5), accepts_rx.recv())
        .await
        .expect("first connect never happened")
        .unwrap();
    timeout(Duration::from_secs(5), accepts_rx.recv())
        .await
        .expect("client did not reconnect after the transport drop")
        .unwrap();
    wait_for_status(&handle, ConnectionStatus::Connected).await;
}

#[tokio::test]
async fn attempts_are_bounded_until_manual_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (attempts_tx, mut attempts_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            attempts_tx.send(()).ok();
            // Closing before the websocket handshake fails the attempt.
            drop(stream);
        }
    });

    let mut manager = ConnectionManager::new(fast_config(addr));
    let handle = manager.open(Namespace::Contract);

    for attempt in 1..=5 {
        timeout(Duration::from_secs(2), attempts_rx.recv())
            .await
            .unwrap_or_else(|_| panic!("attempt {attempt} never happened"))
            .unwrap();
    }

    // The episode budget is spent: no sixth automatic attempt.
    assert!(
        timeout(Duration::from_millis(400), attempts_rx.recv())
            .await
            .is_err(),
        "a sixth automatic attempt must not happen"
    );
    wait_for_status(&handle, ConnectionStatus::Error).await;

    handle.reconnect();
    timeout(Duration::from_secs(2), attempts_rx.recv())
        .await
        .expect("manual reconnect should dial again")
        .unwrap();
}
