//! Shared helpers for integration tests.
//!
//! [`TestServer`] is a local WebSocket server that records every text
//! frame it receives and lets a test push frames to, or close, the most
//! recent client connection.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use campus_realtime::ClientConfig;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{WebSocketStream, accept_hdr_async};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Logging
// ============================================================================

/// Installs a test log subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Config
// ============================================================================

/// Config pointing at `url` with a slow heartbeat and fast reconnects.
pub fn config(url: &str) -> ClientConfig {
    ClientConfig::builder()
        .base_url(url)
        .heartbeat_interval(Duration::from_secs(60))
        .reconnect_interval(Duration::from_millis(100))
        .max_reconnect_attempts(3)
        .auto_connect(false)
        .build()
        .expect("valid test config")
}

// ============================================================================
// Polling
// ============================================================================

/// Polls `condition` until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    condition()
}

// ============================================================================
// TestServer
// ============================================================================

enum ServerCommand {
    Send(String),
    Close(Option<CloseFrame>),
}

/// Local WebSocket server for driving the client.
pub struct TestServer {
    addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    refusing: Arc<AtomicBool>,
    uris: Arc<Mutex<Vec<String>>>,
    received: Arc<Mutex<Vec<String>>>,
    connections: Arc<Mutex<Vec<mpsc::UnboundedSender<ServerCommand>>>>,
    connection_tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
    accept_task: JoinHandle<()>,
}

impl TestServer {
    /// Binds `127.0.0.1:0` and starts accepting.
    pub async fn start() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let accepted = Arc::new(AtomicUsize::new(0));
        let refusing = Arc::new(AtomicBool::new(false));
        let uris = Arc::new(Mutex::new(Vec::new()));
        let received = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(Mutex::new(Vec::new()));
        let connection_tasks = Arc::new(Mutex::new(Vec::new()));

        let accept_task = tokio::spawn({
            let accepted = Arc::clone(&accepted);
            let refusing = Arc::clone(&refusing);
            let uris = Arc::clone(&uris);
            let received = Arc::clone(&received);
            let connections = Arc::clone(&connections);
            let connection_tasks = Arc::clone(&connection_tasks);

            async move {
                while let Ok((stream, _)) = listener.accept().await {
                    if refusing.load(Ordering::SeqCst) {
                        drop(stream);
                        continue;
                    }

                    let seen = Arc::clone(&uris);
                    let handshake = accept_hdr_async(stream, move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                        seen.lock().push(req.uri().to_string());
                        Ok(resp)
                    })
                    .await;

                    let Ok(ws) = handshake else {
                        continue;
                    };

                    accepted.fetch_add(1, Ordering::SeqCst);
                    let (tx, rx) = mpsc::unbounded_channel();
                    connections.lock().push(tx);
                    connection_tasks
                        .lock()
                        .push(tokio::spawn(serve(ws, rx, Arc::clone(&received))));
                }
            }
        });

        Ok(Self {
            addr,
            accepted,
            refusing,
            uris,
            received,
            connections,
            connection_tasks,
            accept_task,
        })
    }

    /// WebSocket URL of this server.
    pub fn url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Number of completed handshakes.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Request URIs seen during handshakes.
    pub fn uris(&self) -> Vec<String> {
        self.uris.lock().clone()
    }

    /// Every received frame, decoded.
    pub fn received(&self) -> Vec<Value> {
        self.received
            .lock()
            .iter()
            .filter_map(|text| serde_json::from_str(text).ok())
            .collect()
    }

    /// Received frames whose `type` equals `kind`.
    pub fn received_of(&self, kind: &str) -> Vec<Value> {
        self.received()
            .into_iter()
            .filter(|frame| frame["type"] == kind)
            .collect()
    }

    /// Received frames other than heartbeats.
    pub fn received_non_heartbeat(&self) -> Vec<Value> {
        self.received()
            .into_iter()
            .filter(|frame| frame["type"] != "heartbeat")
            .collect()
    }

    /// Sends raw text to the latest connection.
    pub fn push(&self, text: impl Into<String>) {
        if let Some(tx) = self.connections.lock().last() {
            let _ = tx.send(ServerCommand::Send(text.into()));
        }
    }

    /// Starts a close handshake on the latest connection.
    pub fn close_latest(&self, frame: Option<CloseFrame>) {
        if let Some(tx) = self.connections.lock().last() {
            let _ = tx.send(ServerCommand::Close(frame));
        }
    }

    /// While set, TCP connections are dropped before the handshake.
    pub fn set_refusing(&self, refusing: bool) {
        self.refusing.store(refusing, Ordering::SeqCst);
    }

    /// Drops every open connection without a close frame.
    pub fn drop_connections(&self) {
        for task in self.connection_tasks.lock().drain(..) {
            task.abort();
        }
        self.connections.lock().clear();
    }

    /// Stops accepting and drops every connection.
    pub fn shutdown(&self) {
        self.accept_task.abort();
        self.drop_connections();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn serve(
    ws: WebSocketStream<tokio::net::TcpStream>,
    mut commands: mpsc::UnboundedReceiver<ServerCommand>,
    received: Arc<Mutex<Vec<String>>>,
) {
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            message = read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => received.lock().push(text.as_str().to_string()),
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }

            command = commands.recv() => {
                match command {
                    Some(ServerCommand::Send(text)) => {
                        let _ = write.send(Message::Text(text.into())).await;
                    }
                    Some(ServerCommand::Close(frame)) => {
                        let _ = write.send(Message::Close(frame)).await;
                    }
                    None => break,
                }
            }
        }
    }
}
