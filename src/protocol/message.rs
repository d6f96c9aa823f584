//! Typed message payloads.
//!
//! [`Frame::parse`] turns a frame into a [`ParsedMessage`] so handlers can
//! match on known message kinds and still accept anything else through
//! [`ParsedMessage::Unknown`].
//!
//! | Tag | Variant | Payload |
//! |-----|---------|---------|
//! | `heartbeat` | [`ParsedMessage::Heartbeat`] | timestamp |
//! | `chat` | [`ParsedMessage::Chat`] | [`ChatMessage`] |
//! | `notification` | [`ParsedMessage::Notification`] | [`Notification`] |
//! | `order_update` | [`ParsedMessage::OrderUpdate`] | [`OrderUpdate`] |
//! | `user_online` | [`ParsedMessage::UserOnline`] | [`Presence`] |
//! | `user_offline` | [`ParsedMessage::UserOffline`] | [`Presence`] |

// ============================================================================
// Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::frame::{Frame, MessageType};

// ============================================================================
// Payloads
// ============================================================================

/// Chat message payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Server-assigned message id.
    #[serde(default, deserialize_with = "optional_id")]
    pub message_id: Option<String>,
    /// Conversation the message belongs to.
    #[serde(deserialize_with = "required_id")]
    pub conversation_id: String,
    /// Author.
    #[serde(deserialize_with = "required_id")]
    pub sender_id: String,
    /// Message body.
    pub content: String,
    /// Content kind such as `text` or `image`.
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Notification payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification id.
    #[serde(default, deserialize_with = "optional_id")]
    pub notification_id: Option<String>,
    /// Short title.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub content: Option<String>,
    /// Category such as `system` or `trade`.
    #[serde(default)]
    pub category: Option<String>,
    /// In-app link to open.
    #[serde(default)]
    pub link: Option<String>,
}

/// Order status change payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    /// Order id.
    #[serde(deserialize_with = "required_id")]
    pub order_id: String,
    /// New status.
    pub status: String,
    /// Status before the change.
    #[serde(default)]
    pub previous_status: Option<String>,
    /// Human readable note.
    #[serde(default)]
    pub message: Option<String>,
}

/// Presence payload for online/offline frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    /// User whose presence changed.
    #[serde(deserialize_with = "required_id")]
    pub user_id: String,
}

// ============================================================================
// ParsedMessage
// ============================================================================

/// Frame decoded by message type.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedMessage {
    /// Keep-alive.
    Heartbeat {
        /// Timestamp from the payload, if present.
        timestamp: Option<u64>,
    },
    /// Chat message.
    Chat(ChatMessage),
    /// Notification.
    Notification(Notification),
    /// Order status change.
    OrderUpdate(OrderUpdate),
    /// User came online.
    UserOnline(Presence),
    /// User went offline.
    UserOffline(Presence),
    /// Custom tag, or a known tag whose payload did not match its schema.
    Unknown {
        /// Message type tag.
        kind: MessageType,
        /// Raw payload.
        data: Value,
    },
}

// ============================================================================
// Frame Parsing Implementation
// ============================================================================

impl Frame {
    /// Parses the payload into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ParsedMessage {
        match self.kind() {
            MessageType::Heartbeat => ParsedMessage::Heartbeat {
                timestamp: self.data().get("timestamp").and_then(Value::as_u64),
            },
            MessageType::Chat => self.decode(ParsedMessage::Chat),
            MessageType::Notification => self.decode(ParsedMessage::Notification),
            MessageType::OrderUpdate => self.decode(ParsedMessage::OrderUpdate),
            MessageType::UserOnline => self.decode(ParsedMessage::UserOnline),
            MessageType::UserOffline => self.decode(ParsedMessage::UserOffline),
            MessageType::Custom(_) => self.unknown(),
        }
    }

    fn decode<T: DeserializeOwned>(&self, wrap: fn(T) -> ParsedMessage) -> ParsedMessage {
        match T::deserialize(self.data()) {
            Ok(payload) => wrap(payload),
            Err(_) => self.unknown(),
        }
    }

    fn unknown(&self) -> ParsedMessage {
        ParsedMessage::Unknown {
            kind: self.kind().clone(),
            data: self.data().clone(),
        }
    }
}

// ============================================================================
// Id Helpers
// ============================================================================

/// Ids arrive as strings or numbers depending on the backend table.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn required_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(deserializer).map(|id| id.map(String::from))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_chat_parsing() {
        let frame = Frame::new(
            MessageType::Chat,
            json!({
                "messageId": 981,
                "conversationId": "c-7",
                "senderId": 42,
                "content": "Is the bike still available?",
                "contentType": "text"
            }),
        );

        match frame.parse() {
            ParsedMessage::Chat(chat) => {
                assert_eq!(chat.message_id.as_deref(), Some("981"));
                assert_eq!(chat.conversation_id, "c-7");
                assert_eq!(chat.sender_id, "42");
                assert_eq!(chat.content, "Is the bike still available?");
                assert_eq!(chat.content_type.as_deref(), Some("text"));
            }
            other => panic!("unexpected parsed message: {other:?}"),
        }
    }

    #[test]
    fn test_order_update_parsing() {
        let frame = Frame::new(
            "order_update",
            json!({ "orderId": "o-1", "status": "SHIPPED", "previousStatus": "PAID" }),
        );

        match frame.parse() {
            ParsedMessage::OrderUpdate(update) => {
                assert_eq!(update.order_id, "o-1");
                assert_eq!(update.status, "SHIPPED");
                assert_eq!(update.previous_status.as_deref(), Some("PAID"));
                assert!(update.message.is_none());
            }
            other => panic!("unexpected parsed message: {other:?}"),
        }
    }

    #[test]
    fn test_notification_parsing() {
        let frame = Frame::new(
            "notification",
            json!({ "title": "New comment", "category": "community" }),
        );
        assert!(matches!(
            frame.parse(),
            ParsedMessage::Notification(Notification { ref title, .. }) if title == "New comment"
        ));
    }

    #[test]
    fn test_presence_parsing() {
        let online = Frame::new("user_online", json!({ "userId": 7 }));
        let offline = Frame::new("user_offline", json!({ "userId": "u-7" }));

        assert_eq!(
            online.parse(),
            ParsedMessage::UserOnline(Presence { user_id: "7".into() })
        );
        assert_eq!(
            offline.parse(),
            ParsedMessage::UserOffline(Presence { user_id: "u-7".into() })
        );
    }

    #[test]
    fn test_heartbeat_parsing() {
        assert_eq!(
            Frame::heartbeat(55).parse(),
            ParsedMessage::Heartbeat { timestamp: Some(55) }
        );
    }

    #[test]
    fn test_known_type_with_bad_payload_is_unknown() {
        let frame = Frame::new("order_update", json!({ "status": 3 }));
        match frame.parse() {
            ParsedMessage::Unknown { kind, .. } => assert_eq!(kind, MessageType::OrderUpdate),
            other => panic!("expected Unknown, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_type_is_unknown() {
        let frame = Frame::new("listing_price_drop", json!({ "listingId": 3 }));
        match frame.parse() {
            ParsedMessage::Unknown { kind, data } => {
                assert_eq!(kind.as_str(), "listing_price_drop");
                assert_eq!(data["listingId"], 3);
            }
            other => panic!("expected Unknown, got {other:?}"),
        }
    }
}
