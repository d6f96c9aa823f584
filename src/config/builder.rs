//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and validating [`ClientConfig`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use campus_realtime::ClientConfig;
//!
//! # fn example() -> campus_realtime::Result<()> {
//! let config = ClientConfig::builder()
//!     .base_url("wss://market.example.edu/ws")
//!     .heartbeat_interval(Duration::from_secs(20))
//!     .max_reconnect_attempts(8)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

use super::options::{ClientConfig, OverflowPolicy};

// ============================================================================
// ClientConfigBuilder
// ============================================================================

/// Builder for a validated [`ClientConfig`].
///
/// Use [`ClientConfig::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

// ============================================================================
// ClientConfigBuilder Implementation
// ============================================================================

impl ClientConfigBuilder {
    /// Creates a builder seeded with default values.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the WebSocket endpoint (`ws://` or `wss://`).
    #[inline]
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Sets the heartbeat interval.
    #[inline]
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self
    }

    /// Sets the fixed reconnect delay.
    #[inline]
    #[must_use]
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.config.reconnect_interval = interval;
        self
    }

    /// Sets the maximum number of consecutive reconnect attempts.
    ///
    /// Zero disables automatic reconnection.
    #[inline]
    #[must_use]
    pub fn max_reconnect_attempts(mut self, max: u32) -> Self {
        self.config.max_reconnect_attempts = max;
        self
    }

    /// Sets whether the dispatcher connects on creation.
    #[inline]
    #[must_use]
    pub fn auto_connect(mut self, enabled: bool) -> Self {
        self.config.auto_connect = enabled;
        self
    }

    /// Bounds the outbound queue.
    #[inline]
    #[must_use]
    pub fn max_queued_frames(mut self, max: usize) -> Self {
        self.config.max_queued_frames = Some(max);
        self
    }

    /// Removes the outbound queue bound.
    #[inline]
    #[must_use]
    pub fn unbounded_queue(mut self) -> Self {
        self.config.max_queued_frames = None;
        self
    }

    /// Sets the queue overflow policy.
    #[inline]
    #[must_use]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.config.overflow_policy = policy;
        self
    }

    /// Builds the configuration with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if the base URL does not parse or is not `ws`/`wss`
    /// - [`Error::Config`] if an interval or the queue bound is zero
    pub fn build(self) -> Result<ClientConfig> {
        self.validate_url()?;
        self.validate_intervals()?;
        self.validate_queue()?;

        Ok(self.config)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientConfigBuilder {
    /// Validates the endpoint URL.
    fn validate_url(&self) -> Result<()> {
        let raw = &self.config.base_url;
        let url = Url::parse(raw).map_err(|e| Error::invalid_url(raw, e.to_string()))?;

        match url.scheme() {
            "ws" | "wss" => Ok(()),
            other => Err(Error::invalid_url(
                raw,
                format!("unsupported scheme '{other}', expected ws or wss"),
            )),
        }
    }

    /// Validates timer intervals.
    fn validate_intervals(&self) -> Result<()> {
        if self.config.heartbeat_interval.is_zero() {
            return Err(Error::config("Heartbeat interval must be non-zero"));
        }
        if self.config.reconnect_interval.is_zero() {
            return Err(Error::config("Reconnect interval must be non-zero"));
        }
        Ok(())
    }

    /// Validates the queue bound.
    fn validate_queue(&self) -> Result<()> {
        if self.config.max_queued_frames == Some(0) {
            return Err(Error::config(
                "Outbound queue capacity must be non-zero. Use .unbounded_queue() to remove the bound.",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
