//! TTL-based, concurrency-safe cache wrapping any loader (spec §4.8).
#![warn(missing_docs)]
#![deny(unsafe_code)]

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Something that can produce a `T` for a given key, at some cost (a
/// network round-trip, a verify call, …). [`TtlCache`] wraps any such
/// source.
pub trait Loader<T>: Send + Sync {
    /// The error type a failed load produces. Never cached.
    type Error;

    /// Load the value for `key`.
    ///
    /// # Errors
    /// Implementation-defined; [`TtlCache`] never caches an `Err`.
    fn load(&self, key: &str) -> Result<T, Self::Error>;
}

struct Entry<T> {
    value: T,
    expiry: Instant,
}

/// A read-write-lock-protected `name -> entry` map with TTL expiry.
///
/// Contract (spec §4.8):
/// - a hit requires both a present entry and `now < entry.expiry`;
/// - a miss or expired entry acquires a write lock, re-checks
///   (double-checked locking), loads from the underlying source, and
///   populates the entry;
/// - errors are never cached;
/// - different keys never interfere with each other's locking;
/// - two concurrent misses on the same key may both issue an underlying
///   load — the cache does not coalesce concurrent misses.
pub struct TtlCache<T, L: Loader<T>> {
    loader: L,
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry<T>>>,
}

impl<T: Clone, L: Loader<T>> TtlCache<T, L> {
    /// Wrap `loader`, caching each successful load for `ttl`.
    #[must_use]
    pub fn new(loader: L, ttl: Duration) -> Self {
        Self { loader, ttl, entries: RwLock::new(HashMap::new()) }
    }

    /// Fetch `key`, serving a live cached value if present, else loading
    /// and populating the cache.
    ///
    /// # Errors
    /// Propagates the underlying [`Loader::Error`] on a miss that fails to
    /// load; the failed attempt leaves no cache entry behind.
    pub fn get(&self, key: &str) -> Result<T, L::Error> {
        let now = Instant::now();

        if let Some(value) = self.read_if_live(key, now) {
            return Ok(value);
        }

        let mut write_guard = self.entries.write().expect("lock poisoned");
        if let Some(entry) = write_guard.get(key) {
            if entry.expiry > now {
                return Ok(entry.value.clone());
            }
        }

        let value = self.loader.load(key)?;
        write_guard.insert(key.to_string(), Entry { value: value.clone(), expiry: now + self.ttl });
        Ok(value)
    }

    fn read_if_live(&self, key: &str, now: Instant) -> Option<T> {
        let read_guard = self.entries.read().expect("lock poisoned");
        let entry = read_guard.get(key)?;
        (entry.expiry > now).then(|| entry.value.clone())
    }

    /// Number of entries currently held, live or expired. Diagnostic only.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// True iff [`Self::len`] is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
