//! WebSocket transport layer.
//!
//! This module owns the client socket and the machinery that keeps it
//! usable across network trouble.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────┐                       ┌──────────────┐
//! │  Transport (Rust)           │                       │  Server      │
//! │                             │      WebSocket        │              │
//! │  OutboundQueue ──► writer ──┼──────────────────────►│              │
//! │  Heartbeat ─────► writer    │  base_url?token=...   │              │
//! │  MessageHandler ◄── reader ◄┼───────────────────────┤              │
//! │  Reconnector (timer)        │                       │              │
//! └─────────────────────────────┘                       └──────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Transport::connect` - Read token, build URL, spawn socket task
//! 2. Open - Reset reconnect counter, start heartbeat, flush queue
//! 3. Frames flow; inbound frames go to the message handler
//! 4. Close - Stop heartbeat; reconnect unless closed by `disconnect`
//! 5. `Transport::disconnect` - Close and suppress reconnection
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Transport and socket event loop |
//! | `heartbeat` | Keep-alive ticker |
//! | `queue` | Outbound frame queue |
//! | `reconnect` | Reconnect counter and timer |
//! | `state` | Connection state and close details |

// ============================================================================
// Submodules
// ============================================================================

/// Transport and socket event loop.
pub mod connection;

/// Keep-alive ticker.
pub mod heartbeat;

/// Outbound frame queue.
pub mod queue;

/// Reconnect counter and timer.
pub mod reconnect;

/// Connection state and close details.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{
    CloseCallback, ErrorCallback, MessageHandler, OpenCallback, ReconnectCallback, Transport,
};
pub use heartbeat::Heartbeat;
pub use queue::{OutboundQueue, PushOutcome};
pub use reconnect::{ReconnectPolicy, Reconnector};
pub use state::{CloseInfo, ConnectionState};
