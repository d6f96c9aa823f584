//! Typed pub/sub dispatch.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Dispatcher`] | Application handle: transport plus registry |
//! | [`SubscriberRegistry`] | Message type to handler set |
//! | [`Handler`] | Subscriber callback (`Arc<dyn Fn(&Frame)>`) |
//!
//! Inbound heartbeats stop here; every other frame goes to the handlers
//! registered for its type, or is logged and dropped if there are none.

// ============================================================================
// Submodules
// ============================================================================

/// Dispatcher implementation.
pub mod core;

/// Subscriber registry.
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::Dispatcher;
pub use registry::{Handler, SubscriberRegistry, handler};
