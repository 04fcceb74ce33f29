//! Command Handler
//!
//! This module runs validated commands against a store and turns the results
//! into [`Outcome`]s. It holds no state of its own: everything lives in the
//! store it is handed.
//!
//! ## Supported Commands
//!
//! - `SET key value [EX seconds]` - Set a key, optionally with a TTL
//! - `GET key` - Get a key's value
//! - `QUIT` - Close the connection
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        dispatch()                           │
//! │                                                             │
//! │  ┌──────────────────┐    ┌─────────────┐                    │
//! │  │ Command::parse() │───>│  execute()  │───> Outcome        │
//! │  └────────┬─────────┘    └──────┬──────┘                    │
//! │           │ CommandError        │                           │
//! │           └──> Outcome::Error   ▼                           │
//! │                              KvStore                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::commands::{Command, CommandName};
use crate::protocol::{Outcome, Tokens};
use crate::storage::KvStore;

/// The result of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// What to send back to the client
    pub outcome: Outcome,
    /// The command that ran, or None if the request was rejected
    pub command: Option<CommandName>,
}

impl Reply {
    /// Returns true if the connection should close after this reply.
    pub fn closes_session(&self) -> bool {
        self.command == Some(CommandName::Quit)
    }
}

/// Parses and executes one request.
///
/// Invalid requests are answered with [`Outcome::Error`] and never reach the
/// store.
///
/// # Example
///
/// ```
/// use ttlkv::commands::dispatch;
/// use ttlkv::protocol::Outcome;
/// use ttlkv::storage::TtlStore;
/// use bytes::Bytes;
///
/// let mut store = TtlStore::new();
/// let set = vec![Bytes::from("SET"), Bytes::from("name"), Bytes::from("Alice")];
/// assert_eq!(dispatch(set, &mut store), Outcome::Ok);
///
/// let get = vec![Bytes::from("GET"), Bytes::from("name")];
/// assert_eq!(dispatch(get, &mut store), Outcome::value("Alice"));
/// ```
pub fn dispatch<S: KvStore + ?Sized>(tokens: Tokens, store: &mut S) -> Outcome {
    respond(tokens, store).outcome
}

/// Like [`dispatch`], but also reports which command ran.
pub fn respond<S: KvStore + ?Sized>(tokens: Tokens, store: &mut S) -> Reply {
    match Command::parse(tokens) {
        Ok(command) => {
            let name = command.name();
            Reply {
                outcome: execute(command, store),
                command: Some(name),
            }
        }
        Err(e) => Reply {
            outcome: Outcome::error(e.to_string()),
            command: None,
        },
    }
}

/// Executes a validated command.
pub fn execute<S: KvStore + ?Sized>(command: Command, store: &mut S) -> Outcome {
    match command {
        Command::Set { key, value, ttl } => {
            store.set(key, value, ttl);
            Outcome::Ok
        }
        Command::Get { key } => match store.get(&key) {
            Some(value) => Outcome::Value(value),
            None => Outcome::Null,
        },
        // Closing the connection is the session's job
        Command::Quit => Outcome::Ok,
    }
}
