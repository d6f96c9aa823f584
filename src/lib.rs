//! Campus Realtime - reconnecting WebSocket transport with typed pub/sub.
//!
//! This library carries the marketplace's real-time traffic (chat,
//! notifications, order-status pushes, presence) over one authenticated
//! WebSocket connection.
//!
//! # Architecture
//!
//! ```text
//! application ──► Dispatcher ──► Transport ──► WebSocket ──► server
//!                    │              │
//!                    │              ├─ Heartbeat (keep-alive ticker)
//!                    │              ├─ Reconnector (fixed interval, bounded)
//!                    │              └─ OutboundQueue (FIFO until open)
//!                    └─ SubscriberRegistry (type → handler set)
//! ```
//!
//! Key design principles:
//!
//! - Best effort, at-most-once delivery: `send`, `connect` and `disconnect`
//!   never return errors; failures are logged and reported via callbacks
//! - Frames sent while disconnected are queued and flushed in order on open
//! - Unexpected closes reconnect at a fixed interval until the attempt
//!   budget is spent; `disconnect()` suppresses reconnection
//! - One subscriber's panic never stops delivery to the others
//!
//! # Quick Start
//!
//! ```no_run
//! use campus_realtime::{ClientConfig, Dispatcher, MemoryTokenStore, MessageType, ParsedMessage, handler};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> campus_realtime::Result<()> {
//!     let config = ClientConfig::builder()
//!         .base_url("wss://market.example.edu/ws")
//!         .build()?;
//!
//!     let dispatcher = Dispatcher::new(config, MemoryTokenStore::with_token("jwt"));
//!
//!     dispatcher.subscribe(MessageType::OrderUpdate, handler(|frame| {
//!         if let ParsedMessage::OrderUpdate(update) = frame.parse() {
//!             println!("order {} is now {}", update.order_id, update.status);
//!         }
//!     }));
//!
//!     dispatcher.send_message(MessageType::Chat, json!({ "conversationId": "c-1", "content": "hi" }));
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Client configuration and builder |
//! | [`dispatcher`] | [`Dispatcher`] and subscriber registry |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Frame and message types |
//! | [`storage`] | Bearer token stores |
//! | [`transport`] | WebSocket transport layer |

// ============================================================================
// Modules
// ============================================================================

/// Client configuration.
///
/// Use [`ClientConfig::builder()`] or [`ClientConfig::from_env()`].
pub mod config;

/// Typed pub/sub dispatch.
///
/// [`Dispatcher`] is the entry point for application code.
pub mod dispatcher;

/// Error types and result aliases.
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// WebSocket frame and message types.
pub mod protocol;

/// Bearer token storage.
pub mod storage;

/// WebSocket transport layer.
///
/// Connection lifecycle, heartbeat, reconnect and outbound queue.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Config types
pub use config::{ClientConfig, ClientConfigBuilder, OverflowPolicy};

// Dispatcher types
pub use dispatcher::{Dispatcher, Handler, SubscriberRegistry, handler};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::FrameId;

// Protocol types
pub use protocol::{
    ChatMessage, CustomTag, Frame, MessageType, Notification, OrderUpdate, ParsedMessage,
    Presence,
};

// Storage types
pub use storage::{FileTokenStore, MemoryTokenStore, TOKEN_KEY, TokenStore};

// Transport types
pub use transport::{CloseInfo, ConnectionState, Transport};
