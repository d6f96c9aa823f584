//! Wire frame and message type tags.
//!
//! # Format
//!
//! ```json
//! {
//!   "type": "chat",
//!   "data": { ... },
//!   "id": "optional-id",
//!   "timestamp": 1718000000000
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::Result;
use crate::identifiers::FrameId;

// ============================================================================
// Helpers
// ============================================================================

/// Current time in milliseconds since the Unix epoch.
#[inline]
#[must_use]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// ============================================================================
// MessageType
// ============================================================================

/// Message type tag carried in the frame's `type` field.
///
/// Unrecognised tags are kept verbatim in [`MessageType::Custom`] so new
/// server message kinds can be subscribed to before this enum learns them.
/// Build tags with `MessageType::from("...")`: known tags always map to
/// their own variant, so `Custom` never holds one of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    /// Keep-alive frame, never surfaced to subscribers.
    Heartbeat,
    /// Chat message.
    Chat,
    /// User notification.
    Notification,
    /// Order status change.
    OrderUpdate,
    /// A user came online.
    UserOnline,
    /// A user went offline.
    UserOffline,
    /// Any other tag.
    Custom(CustomTag),
}

impl MessageType {
    /// Returns the wire tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Heartbeat => "heartbeat",
            Self::Chat => "chat",
            Self::Notification => "notification",
            Self::OrderUpdate => "order_update",
            Self::UserOnline => "user_online",
            Self::UserOffline => "user_offline",
            Self::Custom(tag) => tag.as_str(),
        }
    }

    /// Returns `true` for the heartbeat tag.
    #[inline]
    #[must_use]
    pub fn is_heartbeat(&self) -> bool {
        matches!(self, Self::Heartbeat)
    }
}

impl From<&str> for MessageType {
    fn from(tag: &str) -> Self {
        match tag {
            "heartbeat" => Self::Heartbeat,
            "chat" => Self::Chat,
            "notification" => Self::Notification,
            "order_update" => Self::OrderUpdate,
            "user_online" => Self::UserOnline,
            "user_offline" => Self::UserOffline,
            other => Self::Custom(CustomTag(other.to_string())),
        }
    }
}

impl From<String> for MessageType {
    fn from(tag: String) -> Self {
        match Self::from(tag.as_str()) {
            Self::Custom(_) => Self::Custom(CustomTag(tag)),
            known => known,
        }
    }
}

impl From<MessageType> for String {
    fn from(kind: MessageType) -> Self {
        match kind {
            MessageType::Custom(tag) => tag.0,
            known => known.as_str().to_string(),
        }
    }
}

// ============================================================================
// CustomTag
// ============================================================================

/// Tag of a message type this crate has no variant for.
///
/// Only created through `MessageType::from`, which never produces one
/// for a known tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomTag(String);

impl CustomTag {
    /// Returns the wire tag.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Frame
// ============================================================================

/// One JSON message exchanged over the socket.
///
/// Frames are immutable; the `with_*` helpers consume and return a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Message type tag.
    #[serde(rename = "type")]
    kind: MessageType,

    /// Type-specific payload.
    #[serde(default)]
    data: Value,

    /// Optional identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<FrameId>,

    /// Milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<u64>,
}

impl Frame {
    /// Creates a frame without id or timestamp.
    #[inline]
    #[must_use]
    pub fn new(kind: impl Into<MessageType>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
            id: None,
            timestamp: None,
        }
    }

    /// Creates a heartbeat frame: `{"type":"heartbeat","data":{"timestamp":now}}`.
    #[inline]
    #[must_use]
    pub fn heartbeat(now: u64) -> Self {
        Self::new(MessageType::Heartbeat, json!({ "timestamp": now }))
    }

    /// Sets the frame id.
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: impl Into<FrameId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets a freshly generated frame id.
    #[inline]
    #[must_use]
    pub fn with_generated_id(self) -> Self {
        self.with_id(FrameId::generate())
    }

    /// Sets the timestamp.
    #[inline]
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Fills the timestamp with `now` if it is absent.
    #[inline]
    #[must_use]
    pub fn stamped(mut self, now: u64) -> Self {
        self.timestamp.get_or_insert(now);
        self
    }

    /// Returns the message type.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &MessageType {
        &self.kind
    }

    /// Returns the payload.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Returns the frame id, if any.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<&FrameId> {
        self.id.as_ref()
    }

    /// Returns the timestamp, if any.
    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> Option<u64> {
        self.timestamp
    }

    /// Returns `true` if this is a heartbeat frame.
    #[inline]
    #[must_use]
    pub fn is_heartbeat(&self) -> bool {
        self.kind.is_heartbeat()
    }

    /// Decodes a frame from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the text is not a valid frame.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encodes the frame as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
