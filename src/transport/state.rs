//! Connection state and close details.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio_tungstenite::tungstenite::Utf8Bytes;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

// ============================================================================
// Constants
// ============================================================================

/// Close code for a normal, client-requested close.
pub const CLOSE_NORMAL: u16 = 1000;

/// Close code used when the connection dropped without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the socket.
///
/// Numbered like the browser `readyState` (0..=3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Handshake in progress.
    Connecting,
    /// Frames flow in both directions.
    Open,
    /// Close handshake in progress.
    Closing,
    /// No socket.
    #[default]
    Closed,
}

impl ConnectionState {
    /// Returns the numeric ready state.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Open => 1,
            Self::Closing => 2,
            Self::Closed => 3,
        }
    }

    /// Returns `true` when frames can be transmitted immediately.
    #[inline]
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// CloseInfo
// ============================================================================

/// Details passed to the close callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    /// WebSocket close code, if the peer sent one.
    pub code: Option<u16>,
    /// Close reason text.
    pub reason: String,
    /// `true` if the close handshake completed.
    pub was_clean: bool,
}

impl CloseInfo {
    /// Close requested by this client.
    #[must_use]
    pub fn normal(reason: impl Into<String>) -> Self {
        Self {
            code: Some(CLOSE_NORMAL),
            reason: reason.into(),
            was_clean: true,
        }
    }

    /// Connection lost or never established.
    #[must_use]
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self {
            code: Some(CLOSE_ABNORMAL),
            reason: reason.into(),
            was_clean: false,
        }
    }

    /// Built from a peer close frame.
    #[must_use]
    pub fn from_close_frame(frame: Option<CloseFrame>) -> Self {
        match frame {
            Some(frame) => Self {
                code: Some(u16::from(frame.code)),
                reason: frame.reason.as_str().to_string(),
                was_clean: true,
            },
            None => Self {
                code: None,
                reason: String::new(),
                was_clean: true,
            },
        }
    }

    /// Close frame sent by [`Transport::disconnect`](super::Transport::disconnect).
    #[must_use]
    pub(crate) fn client_close_frame() -> CloseFrame {
        CloseFrame {
            code: CloseCode::Normal,
            reason: Utf8Bytes::from_static("client disconnect"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
