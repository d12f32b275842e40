//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use bytes::BytesMut;

use crate::config::Config;
use crate::error::{KvError, Result};
use crate::protocol::Response;
use crate::router::Router;
use crate::shutdown::Shutdown;

/// Handles a single client connection
///
/// Strictly request-then-response: one read, one dispatch, one write.
pub struct Connection {
    stream: TcpStream,

    /// Fixed-size read buffer (`max_message_size` bytes)
    buffer: BytesMut,

    /// Reference to the command router
    router: Arc<Router>,

    shutdown: Shutdown,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Configures idle timeouts on the socket
    pub fn new(
        stream: TcpStream,
        router: Arc<Router>,
        config: &Config,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // std timeouts apply per call, so this bounds every read (and write)
        stream.set_read_timeout(config.idle_timeout)?;
        if config.write_deadline {
            stream.set_write_timeout(config.idle_timeout)?;
        }

        Ok(Self {
            stream,
            buffer: BytesMut::zeroed(config.max_message_size),
            router,
            shutdown,
            peer_addr,
        })
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Returns `Ok` when the client leaves, idles out or the server shuts
    /// down; `Err` for everything that tears the connection down abnormally.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            if self.shutdown.is_triggered() {
                tracing::debug!("Closing {} for shutdown", self.peer_addr);
                return Ok(());
            }

            let count = match self.stream.read(&mut self.buffer[..]) {
                Ok(0) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Ok(count) => count,
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(ref e)
                    if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut =>
                {
                    // Read timeout (Windows uses TimedOut instead of WouldBlock)
                    tracing::debug!("Idle timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(ref e) if is_disconnect(e) => {
                    tracing::debug!("Connection to {} lost: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(e) => {
                    return Err(KvError::Connection(format!(
                        "read from {} failed: {}",
                        self.peer_addr, e
                    )));
                }
            };

            if count == self.buffer.len() {
                // No reassembly across reads: a full buffer may hold a truncated request
                let _ = self.send(&Response::Error("message too large".to_string()));
                return Err(KvError::Connection(format!(
                    "message from {} exceeds the {} byte buffer",
                    self.peer_addr,
                    self.buffer.len()
                )));
            }

            let response = self.router.handle(&self.buffer[..count]);
            tracing::trace!("Response to {}: {:?}", self.peer_addr, response);

            if let Err(e) = self.send(&response) {
                if let KvError::Io(ref io_err) = e {
                    if is_disconnect(io_err) {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                return Err(KvError::Connection(format!(
                    "write to {} failed: {}",
                    self.peer_addr, e
                )));
            }

            if response.closes_connection() {
                tracing::debug!("Client {} sent exit", self.peer_addr);
                return Ok(());
            }
        }
    }

    /// Send a response to the client
    fn send(&mut self, response: &Response) -> Result<()> {
        if let Some(bytes) = response.encode() {
            self.stream.write_all(&bytes)?;
        }
        Ok(())
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn is_disconnect(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof
            | ErrorKind::NotConnected
    )
}
