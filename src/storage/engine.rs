//! TTL Storage Engine
//!
//! This module implements the in-memory key-value store behind ttlkv. Every
//! key maps to an [`Entry`] holding the value and an optional absolute expiry
//! deadline.
//!
//! ## Design Decisions
//!
//! 1. **Absolute deadlines**: A TTL is turned into `now + ttl` once, at `set`
//!    time, so later reads only compare two instants.
//! 2. **Lazy Expiry**: `get` checks the deadline and removes an expired entry
//!    in the same step, so an expired value is never returned.
//! 3. **Eager Sweep**: `sweep` scans every entry and drops the expired ones, so
//!    keys that are set and never read again do not stay in memory.
//! 4. **One step per operation**: `set`, `get` and `sweep` each touch the map
//!    exactly once. Wrapping the store in a single mutex (see
//!    [`SharedStore`](crate::storage::SharedStore)) is enough to share it.
//!
//! A deadline is inclusive: an entry whose `expires_at` equals the current
//! instant is already expired.

use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Represents a stored value with optional expiry time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The actual value stored
    pub value: Bytes,
    /// When this entry expires (None = never expires)
    pub expires_at: Option<Instant>,
}

impl Entry {
    /// Creates an entry that expires `ttl` after `now`.
    ///
    /// A deadline too far in the future to represent means "never".
    pub fn new(value: Bytes, ttl: Option<Duration>, now: Instant) -> Self {
        Self {
            value,
            expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
        }
    }

    /// Checks if this entry has expired at `now`.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// The operations the command layer needs from a store.
///
/// Each method is a single atomic step on the underlying data, so an
/// implementation may guard the whole store with one lock.
pub trait KvStore {
    /// Inserts or replaces `key`. The previous value and TTL are discarded.
    fn set(&mut self, key: Bytes, value: Bytes, ttl: Option<Duration>);

    /// Returns the live value for `key`, removing it if it has expired.
    fn get(&mut self, key: &[u8]) -> Option<Bytes>;

    /// Removes every entry expired at `now` and returns how many were removed.
    fn sweep(&mut self, now: Instant) -> usize;
}

impl<S: KvStore + ?Sized> KvStore for &mut S {
    fn set(&mut self, key: Bytes, value: Bytes, ttl: Option<Duration>) {
        (**self).set(key, value, ttl)
    }

    fn get(&mut self, key: &[u8]) -> Option<Bytes> {
        (**self).get(key)
    }

    fn sweep(&mut self, now: Instant) -> usize {
        (**self).sweep(now)
    }
}

/// The in-memory key-value store.
///
/// The store is created once by whoever drives the sessions and lent to each
/// one in turn. Dropping it drops every key.
///
/// # Example
///
/// ```
/// use ttlkv::storage::{KvStore, TtlStore};
/// use bytes::Bytes;
/// use std::time::Duration;
///
/// let mut store = TtlStore::new();
///
/// // Set a key
/// store.set(Bytes::from("name"), Bytes::from("Alice"), None);
///
/// // Get the value
/// assert_eq!(store.get(b"name"), Some(Bytes::from("Alice")));
///
/// // Set with expiry
/// store.set(Bytes::from("session"), Bytes::from("abc123"), Some(Duration::from_secs(60)));
/// ```
#[derive(Debug, Default)]
pub struct TtlStore {
    data: HashMap<Bytes, Entry>,
}

impl TtlStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a key as of `now`.
    pub fn set_at(&mut self, key: Bytes, value: Bytes, ttl: Option<Duration>, now: Instant) {
        self.data.insert(key, Entry::new(value, ttl, now));
    }

    /// Gets a key as of `now`.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    /// This implements "lazy expiry" - expired keys are detected and removed on access.
    pub fn get_at(&mut self, key: &[u8], now: Instant) -> Option<Bytes> {
        let expired = self.data.get(key)?.is_expired_at(now);
        if expired {
            self.data.remove(key);
            trace!(key = %key.escape_ascii(), "Expired key removed on access");
            return None;
        }
        self.data.get(key).map(|entry| entry.value.clone())
    }

    /// Returns the entry for `key` without checking or enforcing expiry.
    pub fn entry(&self, key: &[u8]) -> Option<&Entry> {
        self.data.get(key)
    }

    /// Returns true if an entry for `key` is physically present, expired or not.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.data.contains_key(key)
    }

    /// Number of entries physically present, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl KvStore for TtlStore {
    fn set(&mut self, key: Bytes, value: Bytes, ttl: Option<Duration>) {
        self.set_at(key, value, ttl, Instant::now());
    }

    fn get(&mut self, key: &[u8]) -> Option<Bytes> {
        self.get_at(key, Instant::now())
    }

    fn sweep(&mut self, now: Instant) -> usize {
        let before = self.data.len();
        self.data.retain(|_, entry| !entry.is_expired_at(now));
        before - self.data.len()
    }
}
