//! Connection Handling Module
//!
//! This module runs the request/response loop for one client connection.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TCP Listener                            │
//! │                    (server module)                          │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ accept()
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Session                               │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │ Read bytes  │───>│   Decode    │───>│ Sweep + cmd │      │
//! │  └─────────────┘    └─────────────┘    └─────────────┘      │
//! │                                               │             │
//! │                                               ▼             │
//! │                                      ┌─────────────┐        │
//! │                                      │ Send resp   │        │
//! │                                      └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! 1. The server accepts a connection and builds a `Session`
//! 2. The session reads, decodes and answers requests in order
//! 3. End-of-stream or `QUIT` ends the session
//! 4. The server moves on to the next connection
//!
//! ## Example
//!
//! ```ignore
//! use ttlkv::connection::{ConnectionStats, Session};
//! use ttlkv::storage::TtlStore;
//! use std::sync::Arc;
//!
//! let mut store = TtlStore::new();
//! let stats = Arc::new(ConnectionStats::new());
//!
//! // For each accepted connection, one after another...
//! let (stream, addr) = listener.accept().await?;
//! Session::new(stream, addr.to_string(), &mut store, Arc::clone(&stats)).run().await?;
//! ```

pub mod handler;

// Re-export commonly used types
pub use handler::{ConnectionStats, Session, SessionEnd, SessionError};
