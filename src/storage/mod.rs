//! Storage Engine Module
//!
//! This module provides the in-memory key-value store for ttlkv, with
//! per-key TTL expiry.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │              KvStore                 │  set / get / sweep
//! └───────────────┬──────────────────────┘
//!                 │
//!        ┌────────┴─────────┐
//!        ▼                  ▼
//! ┌─────────────┐    ┌──────────────────┐
//! │  TtlStore   │◄───│   SharedStore    │
//! │  HashMap    │    │  Arc<Mutex<..>>  │
//! └─────────────┘    └──────────────────┘
//! ```
//!
//! ## Features
//!
//! - **TTL Support**: Keys can have a time-to-live
//! - **Lazy Expiry**: Expired keys are removed when read
//! - **Eager Sweep**: The session loop sweeps before every command
//! - **Single Lock Sharing**: `SharedStore` guards the whole store with one mutex
//!
//! ## Example
//!
//! ```
//! use ttlkv::storage::{KvStore, TtlStore};
//! use bytes::Bytes;
//! use std::time::Duration;
//!
//! let mut store = TtlStore::new();
//!
//! store.set(Bytes::from("name"), Bytes::from("Alice"), None);
//! assert_eq!(store.get(b"name"), Some(Bytes::from("Alice")));
//!
//! store.set(
//!     Bytes::from("session"),
//!     Bytes::from("token123"),
//!     Some(Duration::from_secs(3600)),
//! );
//! ```

pub mod engine;
pub mod shared;

// Re-export commonly used types
pub use engine::{Entry, KvStore, TtlStore};
pub use shared::SharedStore;
