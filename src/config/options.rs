//! Client configuration values.
//!
//! Holds the knobs that shape a connection: endpoint, heartbeat cadence,
//! reconnect policy and outbound queue bound.
//!
//! # Example
//!
//! ```ignore
//! use campus_realtime::ClientConfig;
//!
//! let config = ClientConfig::default();
//! let url = config.connection_url("eyJhbGciOi...")?;
//! // ws://127.0.0.1:8080/ws?token=eyJhbGciOi...
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::error::{Error, Result};

use super::builder::ClientConfigBuilder;

// ============================================================================
// Constants
// ============================================================================

/// Default WebSocket endpoint.
pub const DEFAULT_BASE_URL: &str = "ws://127.0.0.1:8080/ws";

/// Default interval between heartbeat frames.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Default fixed delay before each reconnect attempt.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(3);

/// Default number of reconnect attempts before giving up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Default outbound queue capacity.
pub const DEFAULT_MAX_QUEUED_FRAMES: usize = 1000;

/// Query parameter carrying the bearer token.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Environment variable names read by [`ClientConfig::from_env`].
pub mod env_vars {
    /// WebSocket endpoint.
    pub const BASE_URL: &str = "REALTIME_WS_URL";
    /// Heartbeat interval in milliseconds.
    pub const HEARTBEAT_INTERVAL_MS: &str = "REALTIME_HEARTBEAT_INTERVAL_MS";
    /// Reconnect interval in milliseconds.
    pub const RECONNECT_INTERVAL_MS: &str = "REALTIME_RECONNECT_INTERVAL_MS";
    /// Maximum reconnect attempts.
    pub const MAX_RECONNECT_ATTEMPTS: &str = "REALTIME_MAX_RECONNECT_ATTEMPTS";
    /// Auto-connect flag (`true`/`false`/`1`/`0`).
    pub const AUTO_CONNECT: &str = "REALTIME_AUTO_CONNECT";
    /// Outbound queue capacity, `0` for unbounded.
    pub const MAX_QUEUED_FRAMES: &str = "REALTIME_MAX_QUEUED_FRAMES";
    /// Overflow policy (`drop_oldest` or `reject_new`).
    pub const QUEUE_OVERFLOW: &str = "REALTIME_QUEUE_OVERFLOW";
}

// ============================================================================
// OverflowPolicy
// ============================================================================

/// What the outbound queue does when it is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Evict the oldest queued frame to make room.
    #[default]
    DropOldest,
    /// Refuse the new frame and keep the queue as is.
    RejectNew,
}

impl FromStr for OverflowPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop_oldest" | "drop-oldest" => Ok(Self::DropOldest),
            "reject_new" | "reject-new" => Ok(Self::RejectNew),
            other => Err(Error::config(format!("Unknown queue overflow policy: {other}"))),
        }
    }
}

// ============================================================================
// ClientConfig
// ============================================================================

/// Configuration for a [`Transport`](crate::transport::Transport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket endpoint without the token parameter.
    pub base_url: String,

    /// Interval between heartbeat frames while open.
    pub heartbeat_interval: Duration,

    /// Fixed delay before each reconnect attempt.
    pub reconnect_interval: Duration,

    /// Consecutive reconnect attempts allowed before giving up.
    pub max_reconnect_attempts: u32,

    /// Connect as soon as the dispatcher is created.
    pub auto_connect: bool,

    /// Outbound queue capacity; `None` means unbounded.
    pub max_queued_frames: Option<usize>,

    /// Behaviour when the outbound queue is full.
    pub overflow_policy: OverflowPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            auto_connect: true,
            max_queued_frames: Some(DEFAULT_MAX_QUEUED_FRAMES),
            overflow_policy: OverflowPolicy::DropOldest,
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientConfig {
    /// Creates a new configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Loads configuration from `REALTIME_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but cannot be parsed,
    /// or if the resulting configuration fails validation.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration using a custom variable lookup.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = ClientConfigBuilder::new();

        if let Some(url) = lookup(env_vars::BASE_URL) {
            builder = builder.base_url(url);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, env_vars::HEARTBEAT_INTERVAL_MS)? {
            builder = builder.heartbeat_interval(Duration::from_millis(ms));
        }
        if let Some(ms) = parse_var::<u64>(&lookup, env_vars::RECONNECT_INTERVAL_MS)? {
            builder = builder.reconnect_interval(Duration::from_millis(ms));
        }
        if let Some(max) = parse_var::<u32>(&lookup, env_vars::MAX_RECONNECT_ATTEMPTS)? {
            builder = builder.max_reconnect_attempts(max);
        }
        if let Some(raw) = lookup(env_vars::AUTO_CONNECT) {
            builder = builder.auto_connect(parse_bool(env_vars::AUTO_CONNECT, &raw)?);
        }
        if let Some(max) = parse_var::<usize>(&lookup, env_vars::MAX_QUEUED_FRAMES)? {
            builder = match max {
                0 => builder.unbounded_queue(),
                n => builder.max_queued_frames(n),
            };
        }
        if let Some(raw) = lookup(env_vars::QUEUE_OVERFLOW) {
            builder = builder.overflow_policy(raw.parse()?);
        }

        builder.build()
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl ClientConfig {
    /// Builds the connection URL with the bearer token appended.
    ///
    /// Existing query parameters on the base URL are preserved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the base URL does not parse.
    pub fn connection_url(&self, token: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::invalid_url(&self.base_url, e.to_string()))?;

        url.query_pairs_mut().append_pair(TOKEN_QUERY_PARAM, token);

        Ok(url)
    }
}

// ============================================================================
// Runtime Guards
// ============================================================================

impl ClientConfig {
    /// Replaces values the transport cannot run with by their defaults.
    ///
    /// Configs built as struct literals skip [`ClientConfigBuilder::build`]
    /// validation; the transport applies this on construction.
    #[must_use]
    pub(crate) fn sanitized(mut self) -> Self {
        if self.heartbeat_interval.is_zero() {
            warn!(
                default_ms = DEFAULT_HEARTBEAT_INTERVAL.as_millis() as u64,
                "Zero heartbeat interval, using default"
            );
            self.heartbeat_interval = DEFAULT_HEARTBEAT_INTERVAL;
        }
        if self.reconnect_interval.is_zero() {
            warn!(
                default_ms = DEFAULT_RECONNECT_INTERVAL.as_millis() as u64,
                "Zero reconnect interval, using default"
            );
            self.reconnect_interval = DEFAULT_RECONNECT_INTERVAL;
        }
        if self.max_queued_frames == Some(0) {
            warn!(
                default = DEFAULT_MAX_QUEUED_FRAMES,
                "Zero outbound queue capacity, using default"
            );
            self.max_queued_frames = Some(DEFAULT_MAX_QUEUED_FRAMES);
        }
        self
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::config(format!("{key}={raw}: {e}"))),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(format!("{key}={raw}: expected a boolean"))),
    }
}

// ============================================================================
// Tests
// ============================================================================
