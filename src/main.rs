//! ttlkv - A Small RESP Key-Value Server
//!
//! This is the main entry point for the ttlkv server.
//! It parses the configuration, sets up logging and runs the accept loop.

use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;
use ttlkv::{Config, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::parse();

    // Set up logging; RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("ttlkv v{}", ttlkv::VERSION);

    let server = Server::bind(&config.bind_address(), config.mode).await?;
    info!("Listening on {}", server.local_addr()?);

    // Main accept loop, until Ctrl+C
    tokio::select! {
        _ = server.run() => {}
        result = signal::ctrl_c() => {
            result?;
            info!("Shutdown signal received, stopping server...");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
