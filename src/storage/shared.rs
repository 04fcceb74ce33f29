//! Lock-guarded store for concurrent sessions.
//!
//! The default server runs one session at a time and lends it the store
//! directly. When sessions run concurrently they share a [`SharedStore`]
//! instead: one mutex around the whole [`TtlStore`], taken once per operation.

use crate::storage::{KvStore, TtlStore};
use bytes::Bytes;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// A cloneable handle to a store guarded by a single mutex.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<Mutex<TtlStore>>,
}

impl SharedStore {
    /// Wraps `store` so it can be shared between sessions.
    pub fn new(store: TtlStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Locks the store for a sequence of operations.
    pub fn lock(&self) -> MutexGuard<'_, TtlStore> {
        // Every operation leaves the map consistent, so a poisoned lock is still usable
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KvStore for SharedStore {
    fn set(&mut self, key: Bytes, value: Bytes, ttl: Option<Duration>) {
        self.lock().set(key, value, ttl)
    }

    fn get(&mut self, key: &[u8]) -> Option<Bytes> {
        self.lock().get(key)
    }

    fn sweep(&mut self, now: Instant) -> usize {
        self.lock().sweep(now)
    }
}
