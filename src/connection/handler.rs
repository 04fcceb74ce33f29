//! Session Loop
//!
//! A [`Session`] drives one client connection from its first byte to
//! end-of-stream. It is generic over the transport, so the same loop runs on
//! a `TcpStream`, an in-memory duplex pipe in tests, or anything else that
//! implements `AsyncRead + AsyncWrite`.
//!
//! ## Per-Chunk Flow
//!
//! ```text
//! read chunk ──> FrameDecoder ──> for each complete request:
//!                                   1. store.sweep(now)
//!                                   2. dispatch
//!                                   3. encode + write + flush
//! ```
//!
//! Responses are written in the order the requests arrived, one write per
//! response. A malformed request is answered with `-ERR ...` and the session
//! carries on; only transport failures end it early.

use crate::commands::respond;
use crate::protocol::{DecodeError, FrameDecoder, Outcome, Tokens};
use crate::storage::KvStore;
use bytes::BytesMut;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Read chunk capacity
const READ_CHUNK_SIZE: usize = 4096;

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands processed
    pub commands_processed: AtomicU64,
    /// Total malformed requests answered with an error
    pub protocol_errors: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written.fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// How a session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer closed its side of the stream
    Eof,
    /// The peer sent `QUIT`
    Quit,
}

/// Errors that end a session.
///
/// None of them touch the store; the next session starts with the same data.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended in the middle of a request
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Drives one connection until end-of-stream or `QUIT`.
pub struct Session<T, S> {
    /// The transport for this connection
    transport: T,

    /// Peer label (for logging)
    peer: String,

    /// The store commands run against
    store: S,

    /// Incremental request decoder
    decoder: FrameDecoder,

    /// Buffer for the most recent read
    chunk: BytesMut,

    /// Buffer for the encoded response
    out: Vec<u8>,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl<T, S> Session<T, S>
where
    T: AsyncRead + AsyncWrite + Unpin,
    S: KvStore,
{
    /// Creates a new session.
    ///
    /// # Arguments
    ///
    /// * `transport` - The byte stream for this connection
    /// * `peer` - A label for the peer, used in log lines
    /// * `store` - The store to run commands against
    /// * `stats` - Shared connection statistics
    pub fn new(transport: T, peer: impl Into<String>, store: S, stats: Arc<ConnectionStats>) -> Self {
        stats.connection_opened();

        Self {
            transport,
            peer: peer.into(),
            store,
            decoder: FrameDecoder::new(),
            chunk: BytesMut::with_capacity(READ_CHUNK_SIZE),
            out: Vec::with_capacity(READ_CHUNK_SIZE),
            stats,
        }
    }

    /// Runs the session to completion.
    pub async fn run(mut self) -> Result<SessionEnd, SessionError> {
        info!(client = %self.peer, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(SessionEnd::Eof) => info!(client = %self.peer, "Client disconnected"),
            Ok(SessionEnd::Quit) => info!(client = %self.peer, "Client sent QUIT"),
            Err(SessionError::Io(e)) if e.kind() == std::io::ErrorKind::ConnectionReset => {
                debug!(client = %self.peer, "Connection reset by client")
            }
            Err(e) => warn!(client = %self.peer, error = %e, "Session ended with error"),
        }

        result
    }

    /// The main read-execute-respond loop.
    async fn main_loop(&mut self) -> Result<SessionEnd, SessionError> {
        loop {
            self.chunk.clear();
            let n = self.transport.read_buf(&mut self.chunk).await?;

            if n == 0 {
                self.decoder.finish()?;
                return Ok(SessionEnd::Eof);
            }

            self.stats.bytes_read(n);
            trace!(client = %self.peer, bytes = n, "Read data");

            self.decoder.feed(&self.chunk)?;

            loop {
                match self.decoder.next_frame() {
                    Ok(Some(tokens)) => {
                        if self.handle_request(tokens).await? == Some(SessionEnd::Quit) {
                            return Ok(SessionEnd::Quit);
                        }
                    }
                    Ok(None) => {
                        trace!(
                            client = %self.peer,
                            buffered = self.decoder.buffered(),
                            "Incomplete command, need more data"
                        );
                        break;
                    }
                    Err(e) => {
                        warn!(client = %self.peer, error = %e, "Protocol error");
                        self.stats.protocol_error();
                        self.send_response(&Outcome::error(format!("Protocol error: {}", e)))
                            .await?;
                        break;
                    }
                }
            }
        }
    }

    /// Sweeps, executes one request and sends its response.
    ///
    /// Returns `Some(SessionEnd::Quit)` when the session should close.
    async fn handle_request(&mut self, tokens: Tokens) -> Result<Option<SessionEnd>, SessionError> {
        let expired = self.store.sweep(Instant::now());
        if expired > 0 {
            debug!(client = %self.peer, expired = expired, "Expired keys swept");
        }

        let reply = respond(tokens, &mut self.store);
        self.stats.command_processed();

        match reply.command {
            Some(name) => trace!(client = %self.peer, command = name.as_str(), "Executed command"),
            None => debug!(client = %self.peer, response = %reply.outcome, "Command rejected"),
        }
        self.send_response(&reply.outcome).await?;

        Ok(reply.closes_session().then_some(SessionEnd::Quit))
    }

    /// Sends a response to the client.
    async fn send_response(&mut self, response: &Outcome) -> Result<(), SessionError> {
        self.out.clear();
        response.encode_into(&mut self.out);
        self.transport.write_all(&self.out).await?;
        self.transport.flush().await?;
        self.stats.bytes_written(self.out.len());
        trace!(
            client = %self.peer,
            bytes = self.out.len(),
            "Sent response"
        );
        Ok(())
    }
}

impl<T, S> Drop for Session<T, S> {
    fn drop(&mut self) {
        self.stats.connection_closed();
    }
}
