//! WebSocket protocol message types.
//!
//! Every message in both directions is a JSON [`Frame`]:
//!
//! ```json
//! { "type": "chat", "data": { ... }, "id": "optional", "timestamp": 1718000000000 }
//! ```
//!
//! # Message Types
//!
//! | Tag | Direction | Purpose |
//! |-----|-----------|---------|
//! | `heartbeat` | Client → Server | Keep-alive, never surfaced to subscribers |
//! | `chat` | Both | Chat message |
//! | `notification` | Server → Client | User notification |
//! | `order_update` | Server → Client | Order status push |
//! | `user_online` / `user_offline` | Server → Client | Presence |
//! | anything else | Both | [`MessageType::Custom`] |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `frame` | Frame and message type tags |
//! | `message` | Typed payloads and [`ParsedMessage`] |

// ============================================================================
// Submodules
// ============================================================================

/// Frame and message type tags.
pub mod frame;

/// Typed message payloads.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use frame::{CustomTag, Frame, MessageType, now_ms};
pub use message::{ChatMessage, Notification, OrderUpdate, ParsedMessage, Presence};
