//! Client configuration.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ClientConfig`] | Endpoint, heartbeat, reconnect and queue settings |
//! | [`ClientConfigBuilder`] | Fluent, validating builder |
//! | [`OverflowPolicy`] | Outbound queue overflow behaviour |
//!
//! Settings come from code via the builder or from `REALTIME_*`
//! environment variables via [`ClientConfig::from_env`].

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for configuration.
pub mod builder;

/// Configuration values, defaults and environment loading.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientConfigBuilder;
pub use options::{ClientConfig, OverflowPolicy, env_vars};
