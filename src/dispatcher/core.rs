//! Dispatcher implementation.
//!
//! The dispatcher is the application-facing handle: construct one at
//! startup and pass clones to every component that sends frames or
//! subscribes to message types.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::protocol::{Frame, MessageType};
use crate::storage::TokenStore;
use crate::transport::{CloseInfo, ConnectionState, Transport};

use super::registry::{Handler, SubscriberRegistry};

// ============================================================================
// Dispatcher
// ============================================================================

/// Typed pub/sub over a reconnecting [`Transport`].
///
/// Clones share the same connection and registry.
///
/// # Example
///
/// ```ignore
/// let dispatcher = Dispatcher::new(config, MemoryTokenStore::with_token(jwt));
///
/// let on_chat = handler(|frame| {
///     if let ParsedMessage::Chat(chat) = frame.parse() {
///         println!("{}: {}", chat.sender_id, chat.content);
///     }
/// });
/// dispatcher.subscribe(MessageType::Chat, on_chat.clone());
/// dispatcher.send_message(MessageType::Chat, json!({ "conversationId": "c-1", "content": "hi" }));
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    transport: Transport,
    registry: Arc<SubscriberRegistry>,
}

// ============================================================================
// Dispatcher - Constructor
// ============================================================================

impl Dispatcher {
    /// Creates a dispatcher and, if `auto_connect` is set, connects.
    ///
    /// Auto-connect needs a running tokio runtime; outside one the
    /// attempt is logged and skipped.
    pub fn new(config: ClientConfig, token_store: impl TokenStore + 'static) -> Self {
        let auto_connect = config.auto_connect;
        let transport = Transport::new(config, token_store);
        let registry = Arc::new(SubscriberRegistry::new());

        let routes = Arc::clone(&registry);
        transport.set_message_handler(Arc::new(move |frame: &Frame| {
            routes.dispatch(frame);
        }));

        let dispatcher = Self {
            transport,
            registry,
        };

        if auto_connect {
            debug!("Auto-connect enabled");
            dispatcher.connect();
        }

        dispatcher
    }

    /// Creates a dispatcher from `REALTIME_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the environment holds invalid values.
    pub fn from_env(token_store: impl TokenStore + 'static) -> Result<Self> {
        let config = ClientConfig::from_env()?;
        Ok(Self::new(config, token_store))
    }
}

// ============================================================================
// Dispatcher - Connection
// ============================================================================

impl Dispatcher {
    /// See [`Transport::connect`].
    #[inline]
    pub fn connect(&self) {
        self.transport.connect();
    }

    /// See [`Transport::disconnect`].
    #[inline]
    pub fn disconnect(&self) {
        self.transport.disconnect();
    }

    /// See [`Transport::send`].
    #[inline]
    pub fn send(&self, frame: Frame) {
        self.transport.send(frame);
    }

    /// Sends `{type: kind, data}`.
    #[inline]
    pub fn send_message(&self, kind: impl Into<MessageType>, data: Value) {
        self.send(Frame::new(kind, data));
    }

    /// Current connection state.
    #[inline]
    #[must_use]
    pub fn ready_state(&self) -> ConnectionState {
        self.transport.ready_state()
    }

    /// Returns `true` if the connection is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Underlying transport.
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }
}

// ============================================================================
// Dispatcher - Subscriptions
// ============================================================================

impl Dispatcher {
    /// Registers `handler` for `kind`. Returns `false` if already registered.
    #[inline]
    pub fn subscribe(&self, kind: impl Into<MessageType>, handler: Handler) -> bool {
        self.registry.subscribe(kind, handler)
    }

    /// Removes `handler` from `kind`. Returns `false` if it was not registered.
    #[inline]
    pub fn unsubscribe(&self, kind: impl Into<MessageType>, handler: &Handler) -> bool {
        self.registry.unsubscribe(kind, handler)
    }

    /// Routes a frame as if it had arrived from the server.
    #[inline]
    pub fn dispatch(&self, frame: &Frame) -> usize {
        self.registry.dispatch(frame)
    }

    /// Number of handlers for `kind`.
    #[inline]
    #[must_use]
    pub fn subscriber_count(&self, kind: impl Into<MessageType>) -> usize {
        self.registry.subscriber_count(&kind.into())
    }

    /// Message types with at least one handler.
    #[inline]
    #[must_use]
    pub fn subscribed_types(&self) -> Vec<MessageType> {
        self.registry.subscribed_types()
    }
}

// ============================================================================
// Dispatcher - Lifecycle Callbacks
// ============================================================================

impl Dispatcher {
    /// Sets the open callback.
    pub fn on_open(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.transport.on_open(callback);
    }

    /// Sets the close callback.
    pub fn on_close(&self, callback: impl Fn(&CloseInfo) + Send + Sync + 'static) {
        self.transport.on_close(callback);
    }

    /// Sets the error callback.
    pub fn on_error(&self, callback: impl Fn(&Error) + Send + Sync + 'static) {
        self.transport.on_error(callback);
    }

    /// Sets the reconnect callback.
    pub fn on_reconnect(&self, callback: impl Fn(u32) + Send + Sync + 'static) {
        self.transport.on_reconnect(callback);
    }
}

// ============================================================================
// Tests
// ============================================================================
