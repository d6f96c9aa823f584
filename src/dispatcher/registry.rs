//! Subscriber registry.
//!
//! Maps a message type to a set of handlers. Handler identity is `Arc`
//! pointer identity, so registering the same handler twice keeps one
//! entry. A type whose last handler is removed disappears from the map.

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, error, trace};

use crate::protocol::{Frame, MessageType};

// ============================================================================
// Types
// ============================================================================

/// Subscriber callback.
pub type Handler = Arc<dyn Fn(&Frame) + Send + Sync>;

/// Wraps a closure as a [`Handler`].
///
/// Keep the returned value to unsubscribe later.
#[inline]
#[must_use]
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&Frame) + Send + Sync + 'static,
{
    Arc::new(f)
}

// ============================================================================
// SubscriberRegistry
// ============================================================================

/// Message type to handler set.
#[derive(Default)]
pub struct SubscriberRegistry {
    handlers: RwLock<FxHashMap<MessageType, Vec<Handler>>>,
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handler` for `kind`. Returns `false` if it was already registered.
    pub fn subscribe(&self, kind: impl Into<MessageType>, handler: Handler) -> bool {
        let kind = kind.into();
        let mut handlers = self.handlers.write();
        let set = handlers.entry(kind.clone()).or_default();

        if set.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            trace!(%kind, "Handler already subscribed");
            return false;
        }

        set.push(handler);
        debug!(%kind, subscribers = set.len(), "Handler subscribed");
        true
    }

    /// Removes `handler` from `kind`. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, kind: impl Into<MessageType>, handler: &Handler) -> bool {
        let kind = kind.into();
        let mut handlers = self.handlers.write();

        let Some(set) = handlers.get_mut(&kind) else {
            return false;
        };

        let before = set.len();
        set.retain(|h| !Arc::ptr_eq(h, handler));
        let removed = set.len() != before;

        if set.is_empty() {
            handlers.remove(&kind);
        }

        if removed {
            debug!(%kind, "Handler unsubscribed");
        }
        removed
    }

    /// Delivers `frame` to every handler for its type.
    ///
    /// Heartbeats are never delivered. A panicking handler is logged and
    /// does not stop delivery to the others. Returns the number of
    /// handlers that completed.
    pub fn dispatch(&self, frame: &Frame) -> usize {
        if frame.is_heartbeat() {
            trace!("Heartbeat consumed");
            return 0;
        }

        let kind = frame.kind();

        // Snapshot so handlers can (un)subscribe without deadlocking.
        let snapshot = self.handlers.read().get(kind).cloned();
        let Some(handlers) = snapshot.filter(|set| !set.is_empty()) else {
            debug!(%kind, "No subscribers for message type, frame dropped");
            return 0;
        };

        let mut delivered = 0;
        for handler in &handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(frame))) {
                Ok(()) => delivered += 1,
                Err(panic) => {
                    error!(%kind, panic = panic_message(panic.as_ref()), "Message handler panicked");
                }
            }
        }
        delivered
    }

    /// Number of handlers for `kind`.
    #[must_use]
    pub fn subscriber_count(&self, kind: &MessageType) -> usize {
        self.handlers.read().get(kind).map_or(0, Vec::len)
    }

    /// Message types with at least one handler.
    #[must_use]
    pub fn subscribed_types(&self) -> Vec<MessageType> {
        self.handlers.read().keys().cloned().collect()
    }

    /// Returns `true` if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Removes every handler.
    pub fn clear(&self) {
        self.handlers.write().clear();
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    fn counting() -> (Arc<AtomicUsize>, Handler) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (
            count,
            handler(move |_| {
                inner.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    fn chat() -> Frame {
        Frame::new(MessageType::Chat, json!({ "content": "hi" }))
    }

    #[test]
    fn test_subscribe_is_set_semantics() {
        let registry = SubscriberRegistry::new();
        let (count, h) = counting();

        assert!(registry.subscribe(MessageType::Chat, Arc::clone(&h)));
        assert!(!registry.subscribe(MessageType::Chat, Arc::clone(&h)));
        assert_eq!(registry.subscriber_count(&MessageType::Chat), 1);

        assert_eq!(registry.dispatch(&chat()), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_distinct_closures_are_distinct_handlers() {
        let registry = SubscriberRegistry::new();
        let (a, ha) = counting();
        let (b, hb) = counting();

        registry.subscribe("chat", ha);
        registry.subscribe("chat", hb);

        assert_eq!(registry.dispatch(&chat()), 2);
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_removes_empty_type() {
        let registry = SubscriberRegistry::new();
        let (_, h) = counting();

        registry.subscribe("chat", Arc::clone(&h));
        assert_eq!(registry.subscribed_types(), vec![MessageType::Chat]);

        assert!(registry.unsubscribe("chat", &h));
        assert!(!registry.unsubscribe("chat", &h));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unsubscribe_keeps_siblings() {
        let registry = SubscriberRegistry::new();
        let (_, ha) = counting();
        let (b, hb) = counting();

        registry.subscribe("chat", Arc::clone(&ha));
        registry.subscribe("chat", hb);
        registry.unsubscribe("chat", &ha);

        assert_eq!(registry.dispatch(&chat()), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_handler_does_not_block_siblings() {
        let registry = SubscriberRegistry::new();
        let (count, good) = counting();

        registry.subscribe("chat", handler(|_| panic!("bad subscriber")));
        registry.subscribe("chat", good);

        assert_eq!(registry.dispatch(&chat()), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Registry still usable afterwards.
        assert_eq!(registry.dispatch(&chat()), 1);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unknown_type_is_dropped_without_side_effects() {
        let registry = SubscriberRegistry::new();
        let (count, h) = counting();
        registry.subscribe("chat", h);

        let frame = Frame::new("listing_sold", json!({}));
        assert_eq!(registry.dispatch(&frame), 0);

        assert_eq!(registry.dispatch(&chat()), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_custom_type_routes() {
        let registry = SubscriberRegistry::new();
        let (count, h) = counting();
        registry.subscribe("listing_sold", h);

        assert_eq!(registry.dispatch(&Frame::new("listing_sold", json!({}))), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_heartbeat_never_reaches_subscribers() {
        let registry = SubscriberRegistry::new();
        let (count, h) = counting();
        registry.subscribe(MessageType::Heartbeat, h);

        assert_eq!(registry.dispatch(&Frame::heartbeat(1)), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let registry = Arc::new(SubscriberRegistry::new());
        let slot: Arc<parking_lot::Mutex<Option<Handler>>> = Arc::default();

        let reg = Arc::clone(&registry);
        let me = Arc::clone(&slot);
        let once = handler(move |_| {
            if let Some(h) = me.lock().take() {
                reg.unsubscribe("chat", &h);
            }
        });
        *slot.lock() = Some(Arc::clone(&once));
        registry.subscribe("chat", once);

        assert_eq!(registry.dispatch(&chat()), 1);
        assert!(registry.is_empty());
        assert_eq!(registry.dispatch(&chat()), 0);
    }
}
