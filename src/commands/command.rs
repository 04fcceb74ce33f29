//! Command parsing.
//!
//! A decoded request is a list of byte strings. This module resolves the first
//! one into a [`CommandName`] and validates the rest into a [`Command`]. The
//! command name is matched case-insensitively; every other token is taken
//! literally.

use crate::protocol::Tokens;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while turning tokens into a command.
///
/// The messages are what the client sees after `-ERR `.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The request carried no tokens at all
    #[error("empty command")]
    Empty,

    /// The command name is not one we support
    #[error("unknown command '{0}'")]
    Unknown(String),

    /// GET or QUIT got the wrong number of arguments
    #[error("wrong number of arguments")]
    WrongArity,

    /// SET got neither 2 nor 4 arguments, or its option is not `EX <seconds>`
    #[error("invalid SET syntax")]
    InvalidSetSyntax,
}

/// The commands ttlkv understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandName {
    Set,
    Get,
    Quit,
}

impl CommandName {
    /// Resolves a command name, ignoring ASCII case.
    pub fn resolve(name: &[u8]) -> Option<Self> {
        const NAMES: [(&[u8], CommandName); 3] = [
            (b"SET", CommandName::Set),
            (b"GET", CommandName::Get),
            (b"QUIT", CommandName::Quit),
        ];

        NAMES
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, command)| *command)
    }

    /// The canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::Set => "SET",
            CommandName::Get => "GET",
            CommandName::Quit => "QUIT",
        }
    }
}

/// A validated command, ready to run against a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `SET key value [EX seconds]`
    Set {
        key: Bytes,
        value: Bytes,
        ttl: Option<Duration>,
    },

    /// `GET key`
    Get { key: Bytes },

    /// `QUIT` - close the connection after replying
    Quit,
}

impl Command {
    /// Parses a decoded request into a command.
    pub fn parse(tokens: Tokens) -> Result<Command, CommandError> {
        let mut tokens = tokens.into_iter();
        let name = tokens.next().ok_or(CommandError::Empty)?;
        let args: Vec<Bytes> = tokens.collect();

        let command = CommandName::resolve(&name).ok_or_else(|| {
            CommandError::Unknown(String::from_utf8_lossy(&name).to_uppercase())
        })?;

        match command {
            CommandName::Set => parse_set(args),
            CommandName::Get => {
                let [key] = <[Bytes; 1]>::try_from(args).map_err(|_| CommandError::WrongArity)?;
                Ok(Command::Get { key })
            }
            CommandName::Quit => {
                if !args.is_empty() {
                    return Err(CommandError::WrongArity);
                }
                Ok(Command::Quit)
            }
        }
    }

    /// The name of this command.
    pub fn name(&self) -> CommandName {
        match self {
            Command::Set { .. } => CommandName::Set,
            Command::Get { .. } => CommandName::Get,
            Command::Quit => CommandName::Quit,
        }
    }
}

/// SET key value [EX seconds]
///
/// Every malformed SET, including a wrong argument count, is the same error.
fn parse_set(args: Vec<Bytes>) -> Result<Command, CommandError> {
    let mut args = args.into_iter();
    match (args.next(), args.next(), args.next(), args.next(), args.next()) {
        (Some(key), Some(value), None, None, None) => Ok(Command::Set {
            key,
            value,
            ttl: None,
        }),
        (Some(key), Some(value), Some(option), Some(seconds), None) => {
            if !option.eq_ignore_ascii_case(b"EX") {
                return Err(CommandError::InvalidSetSyntax);
            }
            let seconds = parse_seconds(&seconds).ok_or(CommandError::InvalidSetSyntax)?;
            Ok(Command::Set {
                key,
                value,
                ttl: Some(Duration::from_secs(seconds)),
            })
        }
        _ => Err(CommandError::InvalidSetSyntax),
    }
}

/// Parses a non-negative decimal integer made only of ASCII digits.
fn parse_seconds(token: &[u8]) -> Option<u64> {
    if token.is_empty() || !token.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(token).ok()?.parse().ok()
}
