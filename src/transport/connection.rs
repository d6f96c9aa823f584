//! WebSocket transport and event loop.
//!
//! [`Transport`] owns one client socket and everything tied to its
//! lifecycle: the heartbeat ticker, the reconnect timer and the outbound
//! queue.
//!
//! # Event Loop
//!
//! Each connection attempt spawns a tokio task that:
//!
//! - Performs the handshake against `{base_url}?token={token}`
//! - On open: resets the reconnect counter, starts the heartbeat and
//!   flushes the outbound queue before the open callback runs
//! - Reads inbound frames and hands them to the message handler
//! - Writes outbound frames submitted through [`Transport::send`]
//! - On close: stops the heartbeat, runs the close callback and, unless
//!   the close was requested by [`Transport::disconnect`], schedules a
//!   reconnect
//!
//! # Locking
//!
//! Connection state, outbound queue, reconnect counter and timers sit
//! behind a single mutex. User callbacks always run with no lock held.
//! Every connection attempt carries a generation number; events from a
//! superseded socket are ignored.

// ============================================================================
// Imports
// ============================================================================

use std::sync::{Arc, Weak};

use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::protocol::{Frame, now_ms};
use crate::storage::TokenStore;

use super::heartbeat::Heartbeat;
use super::queue::{OutboundQueue, PushOutcome};
use super::reconnect::{ReconnectPolicy, Reconnector};
use super::state::{CloseInfo, ConnectionState};

// ============================================================================
// Types
// ============================================================================

/// Receives every inbound frame, heartbeats included.
pub type MessageHandler = Arc<dyn Fn(&Frame) + Send + Sync>;

/// Called after the connection opens and the queue is flushed.
pub type OpenCallback = Arc<dyn Fn() + Send + Sync>;

/// Called whenever an open or opening connection closes.
pub type CloseCallback = Arc<dyn Fn(&CloseInfo) + Send + Sync>;

/// Called on socket errors.
pub type ErrorCallback = Arc<dyn Fn(&Error) + Send + Sync>;

/// Called with the attempt number when a reconnect attempt fires.
pub type ReconnectCallback = Arc<dyn Fn(u32) + Send + Sync>;

/// Sender half feeding the socket writer.
type Writer = mpsc::UnboundedSender<Message>;

// ============================================================================
// Callbacks
// ============================================================================

#[derive(Default, Clone)]
struct Callbacks {
    on_open: Option<OpenCallback>,
    on_close: Option<CloseCallback>,
    on_error: Option<ErrorCallback>,
    on_reconnect: Option<ReconnectCallback>,
}

// ============================================================================
// TransportState
// ============================================================================

/// Everything guarded by the transport mutex.
struct TransportState {
    ready_state: ConnectionState,
    /// Bumped on every connect and disconnect.
    generation: u64,
    manually_closed: bool,
    writer: Option<Writer>,
    queue: OutboundQueue,
    reconnector: Reconnector,
    heartbeat: Option<Heartbeat>,
    socket_task: Option<JoinHandle<()>>,
}

impl TransportState {
    fn new(config: &ClientConfig) -> Self {
        Self {
            ready_state: ConnectionState::Closed,
            generation: 0,
            manually_closed: false,
            writer: None,
            queue: OutboundQueue::new(config.max_queued_frames, config.overflow_policy),
            reconnector: Reconnector::new(ReconnectPolicy {
                interval: config.reconnect_interval,
                max_attempts: config.max_reconnect_attempts,
            }),
            heartbeat: None,
            socket_task: None,
        }
    }

    fn stop_heartbeat(&mut self) {
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.stop();
            trace!("Heartbeat stopped");
        }
    }

    /// Writes a frame to the open socket. Failures are logged, the frame is lost.
    fn transmit(&self, frame: &Frame) {
        let Some(writer) = &self.writer else {
            warn!(kind = %frame.kind(), "No socket writer, frame lost");
            return;
        };

        let json = match frame.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(kind = %frame.kind(), error = %e, "Failed to encode frame");
                return;
            }
        };

        if writer.send(Message::Text(json.into())).is_err() {
            warn!(kind = %frame.kind(), "Socket writer closed, frame lost");
        }
    }
}

// ============================================================================
// Shared
// ============================================================================

struct Shared {
    config: ClientConfig,
    token_store: Arc<dyn TokenStore>,
    state: Mutex<TransportState>,
    callbacks: RwLock<Callbacks>,
    message_handler: RwLock<Option<MessageHandler>>,
}

// ============================================================================
// Transport
// ============================================================================

/// Reconnecting WebSocket client.
///
/// Cheap to clone; clones share one connection. Nothing here returns an
/// error to the caller: failures are logged and reported through the
/// error and close callbacks.
///
/// # Example
///
/// ```ignore
/// let transport = Transport::new(ClientConfig::default(), MemoryTokenStore::with_token("jwt"));
/// transport.set_message_handler(Arc::new(|frame| println!("{}", frame.kind())));
/// transport.connect();
/// transport.send(Frame::new("chat", json!({ "content": "hi" })));
/// ```
#[derive(Clone)]
pub struct Transport {
    shared: Arc<Shared>,
}

impl Transport {
    /// Creates a closed transport.
    ///
    /// Zero intervals or a zero queue bound are replaced by defaults.
    pub fn new(config: ClientConfig, token_store: impl TokenStore + 'static) -> Self {
        let config = config.sanitized();
        let state = TransportState::new(&config);
        Self {
            shared: Arc::new(Shared {
                config,
                token_store: Arc::new(token_store),
                state: Mutex::new(state),
                callbacks: RwLock::new(Callbacks::default()),
                message_handler: RwLock::new(None),
            }),
        }
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Opens the connection.
    ///
    /// No-op while connecting or open. Cancels a pending automatic
    /// reconnect. Without a token, with an unusable URL, or outside a tokio
    /// runtime, reports the error and returns without creating a socket;
    /// these paths never schedule a reconnect.
    pub fn connect(&self) {
        self.shared.connect(false);
    }

    /// Closes the connection and suppresses automatic reconnection.
    ///
    /// Idempotent. Stops the heartbeat and any pending reconnect timer.
    pub fn disconnect(&self) {
        self.shared.disconnect();
    }

    /// Sends a frame, stamping it with the current time if unstamped.
    ///
    /// Queued if the connection is not open; flushed in order on open.
    /// With the reject-new policy, a frame refused by a full queue is
    /// reported to the error callback as [`Error::QueueFull`].
    pub fn send(&self, frame: Frame) {
        let frame = frame.stamped(now_ms());

        let rejected = {
            let mut state = self.shared.state.lock();

            if state.ready_state.is_open() && state.writer.is_some() {
                state.transmit(&frame);
                return;
            }

            let kind = frame.kind().clone();
            match state.queue.push(frame) {
                PushOutcome::Queued => {
                    trace!(%kind, queued = state.queue.len(), "Frame queued until open");
                    None
                }
                PushOutcome::DroppedOldest(old) => {
                    warn!(%kind, dropped = %old.kind(), "Outbound queue full, dropped oldest frame");
                    None
                }
                PushOutcome::Rejected(_) => {
                    let capacity = state.queue.capacity().unwrap_or_default();
                    warn!(%kind, capacity, "Outbound queue full, frame rejected");
                    Some(capacity)
                }
            }
        };

        if let Some(capacity) = rejected {
            self.shared.emit_error(&Error::queue_full(capacity));
        }
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// Current connection state.
    #[inline]
    #[must_use]
    pub fn ready_state(&self) -> ConnectionState {
        self.shared.state.lock().ready_state
    }

    /// Returns `true` if the connection is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.ready_state().is_open()
    }

    /// Number of frames waiting for the connection to open.
    #[inline]
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Reconnect attempts since the last successful open.
    #[inline]
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.state.lock().reconnector.attempts()
    }

    // ========================================================================
    // Handlers
    // ========================================================================

    /// Sets the inbound frame handler.
    pub fn set_message_handler(&self, handler: MessageHandler) {
        *self.shared.message_handler.write() = Some(handler);
    }

    /// Clears the inbound frame handler.
    pub fn clear_message_handler(&self) {
        *self.shared.message_handler.write() = None;
    }

    /// Sets the open callback.
    pub fn on_open(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.shared.callbacks.write().on_open = Some(Arc::new(callback));
    }

    /// Sets the close callback.
    pub fn on_close(&self, callback: impl Fn(&CloseInfo) + Send + Sync + 'static) {
        self.shared.callbacks.write().on_close = Some(Arc::new(callback));
    }

    /// Sets the error callback.
    pub fn on_error(&self, callback: impl Fn(&Error) + Send + Sync + 'static) {
        self.shared.callbacks.write().on_error = Some(Arc::new(callback));
    }

    /// Sets the reconnect callback.
    pub fn on_reconnect(&self, callback: impl Fn(u32) + Send + Sync + 'static) {
        self.shared.callbacks.write().on_reconnect = Some(Arc::new(callback));
    }
}

// ============================================================================
// Shared - Lifecycle
// ============================================================================

impl Shared {
    fn connect(self: &Arc<Self>, from_reconnect: bool) {
        if self.state.lock().ready_state != ConnectionState::Closed {
            debug!("Connect skipped, socket already active");
            return;
        }

        let Ok(runtime) = Handle::try_current() else {
            error!("Connect called outside a tokio runtime");
            self.emit_error(&Error::NoRuntime);
            return;
        };

        let Some(token) = self.token_store.token() else {
            warn!("No authentication token, not connecting");
            self.emit_error(&Error::MissingToken);
            return;
        };

        let url = match self.config.connection_url(&token) {
            Ok(url) => url,
            Err(e) => {
                error!(error = %e, "Cannot build connection URL");
                self.emit_error(&e);
                return;
            }
        };

        let mut state = self.state.lock();

        if state.ready_state != ConnectionState::Closed {
            return;
        }
        if from_reconnect && state.manually_closed {
            debug!("Reconnect cancelled by disconnect");
            return;
        }
        if !from_reconnect && state.reconnector.is_pending() {
            debug!("Manual connect supersedes pending reconnect");
            state.reconnector.cancel();
        }

        state.generation += 1;
        state.ready_state = ConnectionState::Connecting;
        let generation = state.generation;

        if let Some(stale) = state.socket_task.take() {
            stale.abort();
        }
        state.socket_task = Some(runtime.spawn(Arc::clone(self).run_socket(generation, url)));

        info!(generation, url = %self.config.base_url, "Connecting");
    }

    fn disconnect(&self) {
        let previous = {
            let mut state = self.state.lock();
            let previous = state.ready_state;

            state.manually_closed = true;
            state.generation += 1;
            state.stop_heartbeat();
            state.reconnector.cancel();

            match state.writer.take() {
                Some(writer) => {
                    // The socket task sends the close frame, then exits on channel close.
                    let _ = writer.send(Message::Close(Some(CloseInfo::client_close_frame())));
                    state.socket_task = None;
                }
                None => {
                    if let Some(task) = state.socket_task.take() {
                        task.abort();
                    }
                }
            }

            state.ready_state = ConnectionState::Closed;
            previous
        };

        if previous == ConnectionState::Closed {
            debug!("Disconnect on closed transport");
            return;
        }

        info!(%previous, "Disconnected by client");
        self.emit_close(&CloseInfo::normal("client disconnect"));
    }

    /// Marks the socket open. Returns `false` if the attempt was superseded.
    fn handle_open(self: &Arc<Self>, generation: u64, writer: Writer) -> bool {
        {
            let mut state = self.state.lock();
            if state.generation != generation {
                return false;
            }

            state.ready_state = ConnectionState::Open;
            state.manually_closed = false;
            state.reconnector.cancel();
            state.reconnector.reset();
            state.writer = Some(writer);

            let weak = Arc::downgrade(self);
            state.heartbeat = Some(Heartbeat::spawn(self.config.heartbeat_interval, move || {
                heartbeat_tick(&weak)
            }));

            let pending: Vec<Frame> = state.queue.drain().collect();
            if !pending.is_empty() {
                debug!(count = pending.len(), "Flushing outbound queue");
            }
            for frame in &pending {
                state.transmit(frame);
            }
        }

        info!(generation, "WebSocket connection established");
        self.emit_open();
        true
    }

    fn handle_close(self: &Arc<Self>, generation: u64, info: CloseInfo) {
        let manually_closed = {
            let mut state = self.state.lock();
            if state.generation != generation {
                trace!(generation, "Ignoring close from superseded socket");
                return;
            }

            state.ready_state = ConnectionState::Closed;
            state.writer = None;
            state.socket_task = None;
            state.stop_heartbeat();
            state.manually_closed
        };

        info!(code = ?info.code, reason = %info.reason, "WebSocket closed");
        self.emit_close(&info);

        if !manually_closed {
            self.schedule_reconnect();
        }
    }

    fn schedule_reconnect(self: &Arc<Self>) {
        let mut state = self.state.lock();

        let Some(attempt) = state.reconnector.next_attempt() else {
            error!(
                attempts = state.reconnector.attempts(),
                max = self.config.max_reconnect_attempts,
                "Max reconnect attempts reached, giving up"
            );
            return;
        };

        info!(
            attempt,
            max = self.config.max_reconnect_attempts,
            delay_ms = self.config.reconnect_interval.as_millis() as u64,
            "Scheduling reconnect"
        );

        let weak = Arc::downgrade(self);
        state.reconnector.schedule(async move {
            if let Some(shared) = weak.upgrade() {
                {
                    let state = shared.state.lock();
                    if state.manually_closed || state.ready_state != ConnectionState::Closed {
                        return;
                    }
                }
                shared.emit_reconnect(attempt);
                shared.connect(true);
            }
        });
    }
}

// ============================================================================
// Shared - Event Loop
// ============================================================================

impl Shared {
    /// Socket task for one connection attempt.
    async fn run_socket(self: Arc<Self>, generation: u64, url: Url) {
        let ws_stream = match connect_async(url.as_str()).await {
            Ok((ws_stream, _response)) => ws_stream,
            Err(e) => {
                warn!(error = %e, "WebSocket handshake failed");
                if self.is_current(generation) {
                    let reason = e.to_string();
                    self.emit_error(&Error::connection(reason.clone()));
                    self.handle_close(generation, CloseInfo::abnormal(reason));
                }
                return;
            }
        };

        let (writer, mut outgoing_rx) = mpsc::unbounded_channel();
        if !self.handle_open(generation, writer) {
            debug!(generation, "Connection superseded before open");
            return;
        }

        let (mut ws_write, mut ws_read) = ws_stream.split();

        let close_info = loop {
            tokio::select! {
                // Incoming frames from server
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_incoming(text.as_str());
                        }

                        Some(Ok(Message::Close(frame))) => {
                            debug!("WebSocket closed by server");
                            self.mark_closing(generation);
                            break CloseInfo::from_close_frame(frame);
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            let reason = e.to_string();
                            if self.is_current(generation) {
                                self.emit_error(&Error::WebSocket(e));
                            }
                            break CloseInfo::abnormal(reason);
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break CloseInfo::abnormal("stream ended");
                        }

                        // Ping is answered by tungstenite; Binary and Pong are ignored
                        _ => {}
                    }
                }

                // Frames from the Rust API
                outgoing = outgoing_rx.recv() => {
                    match outgoing {
                        Some(message) => {
                            if let Err(e) = ws_write.send(message).await {
                                warn!(error = %e, "Failed to transmit frame");
                            }
                        }

                        None => {
                            debug!("Writer released, closing socket");
                            let _ = ws_write.close().await;
                            break CloseInfo::normal("client disconnect");
                        }
                    }
                }
            }
        };

        self.handle_close(generation, close_info);
        debug!(generation, "Socket task terminated");
    }

    /// Decodes one inbound text frame and hands it to the message handler.
    fn handle_incoming(&self, text: &str) {
        let frame = match Frame::from_json(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, len = text.len(), "Dropping malformed frame");
                self.emit_error(&Error::protocol(format!("malformed frame: {e}")));
                return;
            }
        };

        trace!(kind = %frame.kind(), "Frame received");

        let handler = self.message_handler.read().clone();
        match handler {
            Some(handler) => handler(&frame),
            None => debug!(kind = %frame.kind(), "No message handler, frame dropped"),
        }
    }

    fn mark_closing(&self, generation: u64) {
        let mut state = self.state.lock();
        if state.generation == generation {
            state.ready_state = ConnectionState::Closing;
            state.writer = None;
            state.stop_heartbeat();
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.state.lock().generation == generation
    }

    /// Sends a heartbeat if still open; no-op otherwise.
    fn send_heartbeat(&self) {
        let state = self.state.lock();
        if !state.ready_state.is_open() {
            return;
        }

        let now = now_ms();
        state.transmit(&Frame::heartbeat(now).with_timestamp(now));
        trace!("Heartbeat sent");
    }
}

fn heartbeat_tick(weak: &Weak<Shared>) -> bool {
    match weak.upgrade() {
        Some(shared) => {
            shared.send_heartbeat();
            true
        }
        None => false,
    }
}

// ============================================================================
// Shared - Callbacks
// ============================================================================

impl Shared {
    fn emit_open(&self) {
        let callback = self.callbacks.read().on_open.clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    fn emit_close(&self, info: &CloseInfo) {
        let callback = self.callbacks.read().on_close.clone();
        if let Some(callback) = callback {
            callback(info);
        }
    }

    fn emit_error(&self, error: &Error) {
        debug!(%error, recoverable = error.is_recoverable(), "Reporting error");
        let callback = self.callbacks.read().on_error.clone();
        if let Some(callback) = callback {
            callback(error);
        }
    }

    fn emit_reconnect(&self, attempt: u32) {
        let callback = self.callbacks.read().on_reconnect.clone();
        if let Some(callback) = callback {
            callback(attempt);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
