//! Raw policy byte fetch from a configuration store (spec §4.5).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

/// Failure modes for fetching raw bytes from a configuration store.
/// `NotFound` is distinguished from `Transport` because the verifying
/// loader branches on it (missing signature vs. broken store).
#[derive(Debug, Error)]
pub enum LoadError {
    /// No value stored at `name`.
    #[error("no value found at '{0}'")]
    NotFound(String),
    /// Network, authentication, or other transport-layer failure.
    #[error("transport error fetching '{name}': {message}")]
    Transport {
        /// The name that was being fetched.
        name: String,
        /// Underlying cause, scrubbed of store-internal path detail.
        message: String,
    },
}

/// Fetches the bytes of a named policy (or signature) from a configuration
/// store, decrypting on read where the store supports it.
pub trait RawLoader: Send + Sync {
    /// Fetch the raw bytes stored at `name`.
    ///
    /// # Errors
    /// Returns [`LoadError::NotFound`] if nothing is stored at `name`, or
    /// [`LoadError::Transport`] on any other failure.
    fn load_raw(&self, name: &str) -> Result<Vec<u8>, LoadError>;
}

/// An in-memory [`RawLoader`] backed by a fixed map, used in tests and for
/// embedding static policies.
#[derive(Debug, Default, Clone)]
pub struct MapRawLoader {
    entries: HashMap<String, Vec<u8>>,
}

impl MapRawLoader {
    /// An empty loader; every lookup is `NotFound`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    #[must_use]
    pub fn with_entry(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(name.into(), bytes.into());
        self
    }
}

impl RawLoader for MapRawLoader {
    fn load_raw(&self, name: &str) -> Result<Vec<u8>, LoadError> {
        self.entries.get(name).cloned().ok_or_else(|| LoadError::NotFound(name.to_string()))
    }
}

/// A [`RawLoader`] backed by a directory on the local filesystem, where
/// `name` is treated as a relative path under `root`. Used for local
/// development and integration tests standing in for a remote store.
#[derive(Debug)]
pub struct FsRawLoader {
    root: PathBuf,
    // Guards against nothing structurally, but mirrors the store's actual
    // concurrency discipline so callers exercise the same lock shape as a
    // networked implementation would.
    _guard: RwLock<()>,
}

impl FsRawLoader {
    /// Root the loader at `root`; every `load_raw(name)` reads `root/name`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), _guard: RwLock::new(()) }
    }
}

impl RawLoader for FsRawLoader {
    fn load_raw(&self, name: &str) -> Result<Vec<u8>, LoadError> {
        let _read = self._guard.read().expect("lock poisoned");
        let path: &Path = Path::new(name.trim_start_matches('/'));
        let full = self.root.join(path);
        std::fs::read(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(name.to_string()),
            _ => LoadError::Transport { name: name.to_string(), message: e.to_string() },
        })
    }
}
