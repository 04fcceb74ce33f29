//! TCP server glue.
//!
//! Accepts connections and hands each one to a [`Session`]. In
//! [`ServeMode::Serial`] the accept loop awaits every session before accepting
//! the next connection, so exactly one client is served at any instant and
//! the store is lent to it directly. A client that connects meanwhile has its
//! bytes queued by the OS until its turn comes.
//!
//! [`ServeMode::Concurrent`] spawns one task per connection over a
//! [`SharedStore`] instead.

use crate::config::ServeMode;
use crate::connection::{ConnectionStats, Session};
use crate::storage::{SharedStore, TtlStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// A bound listener plus the state shared by its sessions.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    mode: ServeMode,
    stats: Arc<ConnectionStats>,
}

impl Server {
    /// Wraps an already bound listener.
    pub fn new(listener: TcpListener, mode: ServeMode) -> Self {
        Self {
            listener,
            mode,
            stats: Arc::new(ConnectionStats::new()),
        }
    }

    /// Binds `addr` and wraps the listener.
    pub async fn bind(addr: &str, mode: ServeMode) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::new(listener, mode))
    }

    /// The address the server is listening on.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Connection statistics for this server.
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    /// Runs the accept loop forever.
    ///
    /// The store is created here and dropped when the future is dropped.
    pub async fn run(self) {
        info!(mode = ?self.mode, addr = ?self.listener.local_addr().ok(), "Accepting connections");
        match self.mode {
            ServeMode::Serial => self.serve_serial().await,
            ServeMode::Concurrent => self.serve_concurrent().await,
        }
    }

    async fn serve_serial(self) {
        let mut store = TtlStore::new();

        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            // Session errors are logged by the session and never touch the store
            let _ = Session::new(stream, addr.to_string(), &mut store, Arc::clone(&self.stats))
                .run()
                .await;

            info!(keys = store.len(), "Ready for next connection");
        }
    }

    async fn serve_concurrent(self) {
        let store = SharedStore::new(TtlStore::new());

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let session =
                        Session::new(stream, addr.to_string(), store.clone(), Arc::clone(&self.stats));
                    tokio::spawn(async move {
                        let _ = session.run().await;
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}
