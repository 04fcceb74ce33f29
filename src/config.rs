//! Server configuration.
//!
//! Everything the binary needs to start, parsed from the command line.

use crate::{DEFAULT_HOST, DEFAULT_PORT};
use clap::{Parser, ValueEnum};

/// How the server schedules client connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ServeMode {
    /// One connection at a time; later clients wait until the active one disconnects
    #[default]
    Serial,
    /// One task per connection over a lock-guarded store
    Concurrent,
}

/// ttlkv server configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "ttlkv")]
#[command(about = "A small RESP key-value server with per-key TTL expiry")]
#[command(version)]
pub struct Config {
    /// Host to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Connection scheduling
    #[arg(long, value_enum, default_value_t = ServeMode::Serial)]
    pub mode: ServeMode,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            mode: ServeMode::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
