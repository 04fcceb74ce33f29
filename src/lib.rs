//! # ttlkv - A Small RESP Key-Value Engine with TTL Expiry
//!
//! ttlkv speaks a subset of the Redis Serialization Protocol (RESP). It decodes
//! requests from a byte stream, runs them against an in-memory store with
//! per-key time-to-live, and encodes the results back onto the stream.
//!
//! ## Features
//!
//! - **RESP Framing**: Incremental decoder for arrays of bulk strings
//! - **TTL Support**: `SET key value EX seconds` with lazy and eager expiry
//! - **One Session at a Time**: Connections are served strictly one after another
//! - **Lock-Ready Store**: The store sits behind the `KvStore` trait so a
//!   single mutex is enough to share it between concurrent sessions
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                               ttlkv                                 │
//! │                                                                     │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐              │
//! │  │   Server    │───>│   Session   │───>│  dispatch   │              │
//! │  │ (Listener)  │    │   (loop)    │    │             │              │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘              │
//! │                            │                  │                     │
//! │                            ▼                  ▼                     │
//! │                     ┌─────────────┐    ┌─────────────┐              │
//! │                     │FrameDecoder │    │  TtlStore   │              │
//! │                     │  Outcome    │    │ lazy+sweep  │              │
//! │                     └─────────────┘    └─────────────┘              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Data flow: raw bytes → `FrameDecoder` → tokens → `dispatch` → `KvStore`
//! → `Outcome` → `Outcome::encode` → raw bytes.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ttlkv::config::ServeMode;
//! use ttlkv::server::Server;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let server = Server::bind("127.0.0.1:6379", ServeMode::Serial).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Commands
//!
//! - `SET key value [EX seconds]`
//! - `GET key`
//! - `QUIT`
//!
//! ## Module Overview
//!
//! - [`protocol`]: RESP decoder, `Outcome` and encoders
//! - [`storage`]: TTL store and its lock-guarded wrapper
//! - [`commands`]: Command parsing and dispatch
//! - [`connection`]: The per-connection session loop
//! - [`server`]: TCP accept loop
//! - [`config`]: Command-line configuration
//!
//! ## Lazy + Eager Expiry
//!
//! Keys with TTL are expired in two ways:
//! 1. **Lazy**: When a key is read, we check if it's expired
//! 2. **Eager**: The session sweeps every expired key before each command
//!
//! This ensures memory is reclaimed even for keys that are never read again.

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{dispatch, Command, CommandError};
pub use config::{Config, ServeMode};
pub use connection::{ConnectionStats, Session, SessionEnd, SessionError};
pub use protocol::{encode_request, DecodeError, FrameDecoder, Outcome};
pub use server::Server;
pub use storage::{KvStore, SharedStore, TtlStore};

/// The default port ttlkv listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host ttlkv binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of ttlkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
