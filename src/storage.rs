//! Bearer token storage.
//!
//! The transport reads the current token from a [`TokenStore`] on every
//! `connect()`, so a token refreshed by the application is picked up by
//! the next reconnect without rebuilding the client.
//!
//! | Store | Backing |
//! |-------|---------|
//! | [`MemoryTokenStore`] | Process memory |
//! | [`FileTokenStore`] | JSON key-value file, token under [`TOKEN_KEY`] |

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Key under which the bearer token is persisted.
pub const TOKEN_KEY: &str = "token";

// ============================================================================
// TokenStore
// ============================================================================

/// Source of the bearer token used to authenticate the connection.
pub trait TokenStore: Send + Sync {
    /// Returns the current token, or `None` if the user is signed out.
    fn token(&self) -> Option<String>;
}

impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    fn token(&self) -> Option<String> {
        (**self).token()
    }
}

// ============================================================================
// MemoryTokenStore
// ============================================================================

/// In-memory token store.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<RwLock<Option<String>>>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `token`.
    #[inline]
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(token);
        store
    }

    /// Replaces the token.
    pub fn set(&self, token: impl Into<String>) {
        *self.slot.write() = Some(token.into());
    }

    /// Removes the token.
    pub fn clear(&self) {
        *self.slot.write() = None;
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.slot.read().clone().filter(|t| !t.is_empty())
    }
}

// ============================================================================
// FileTokenStore
// ============================================================================

/// Token store backed by a JSON object file.
///
/// Other keys in the file are preserved on write. A missing file means
/// no token.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Creates a store over `path`. The file need not exist yet.
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the token from disk.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file exists but cannot be read
    /// - [`Error::Storage`] if the file is not a JSON object
    pub fn load(&self) -> Result<Option<String>> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string))
    }

    /// Persists `token`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Storage`] if the file cannot be
    /// read or rewritten.
    pub fn store(&self, token: &str) -> Result<()> {
        let mut entries = self.read_entries()?;
        entries.insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));
        self.write_entries(&entries)?;
        debug!(path = %self.path.display(), "Token stored");
        Ok(())
    }

    /// Removes the token, keeping other keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Storage`] if the file cannot be
    /// read or rewritten.
    pub fn clear(&self) -> Result<()> {
        let mut entries = self.read_entries()?;
        if entries.remove(TOKEN_KEY).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }

    fn read_entries(&self) -> Result<Map<String, Value>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(Error::storage(&self.path, "expected a JSON object")),
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, entries)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path)
            .map_err(|e| Error::storage(&self.path, e.to_string()))?;

        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn token(&self) -> Option<String> {
        match self.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read token store");
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
