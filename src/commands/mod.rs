//! Command Dispatch Module
//!
//! This module implements the command processing layer for ttlkv.
//! It receives decoded requests, executes them against the store,
//! and returns protocol-agnostic outcomes.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  FrameDecoder   │  (protocol module)
//! └────────┬────────┘
//!          │ Tokens
//!          ▼
//! ┌─────────────────┐
//! │    dispatch     │  (this module)
//! │                 │
//! │  - Resolve      │
//! │  - Validate     │
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │    KvStore      │  (storage module)
//! └─────────────────┘
//! ```

pub mod command;
pub mod handler;

pub use command::{Command, CommandError, CommandName};
pub use handler::{dispatch, execute, respond, Reply};
