//! TCP Server
//!
//! Accepts connections and hands each one to its own handler thread.

use std::any::Any;
use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::net::{Shutdown as SocketShutdown, SocketAddr, TcpListener, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::sync::WaitGroup;
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{KvError, Result};
use crate::router::Router;
use crate::shutdown::Shutdown;
use super::connection::Connection;
use super::gate::{AdmissionGate, Permit};

/// Sent to clients refused by the admission gate
pub const REJECTION_MESSAGE: &[u8] = b"max connections reached\n";

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// TCP server for walkv
pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
    config: Config,
    gate: Arc<AdmissionGate>,
    registry: Arc<ConnectionRegistry>,
}

impl Server {
    /// Bind the listener. Failing to bind is fatal for the caller.
    pub fn bind(config: Config, router: Arc<Router>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            listener,
            router,
            gate: AdmissionGate::new(config.max_connections),
            registry: Arc::new(ConnectionRegistry::default()),
            config,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the accept loop until `shutdown` fires (blocking)
    ///
    /// On shutdown the listener is closed, open client sockets are shut down
    /// and this waits for every handler thread before returning.
    pub fn run(self, shutdown: Shutdown) -> Result<()> {
        let Server {
            listener,
            router,
            config,
            gate,
            registry,
        } = self;

        let local_addr = listener.local_addr()?;
        tracing::info!(
            "Listening on {} (max {} connections)",
            local_addr,
            gate.capacity()
        );

        let wait_group = WaitGroup::new();
        let mut next_id: u64 = 0;

        while !shutdown.is_triggered() {
            match listener.accept() {
                Ok((stream, peer)) => {
                    next_id += 1;
                    let Some(permit) = gate.try_acquire() else {
                        let err = KvError::ResourceExhausted("max connections reached".into());
                        tracing::warn!("Rejecting {}: {}", peer, err);
                        reject(stream);
                        continue;
                    };

                    let ctx = ConnectionContext {
                        id: next_id,
                        peer,
                        router: Arc::clone(&router),
                        config: &config,
                        registry: &registry,
                        shutdown: &shutdown,
                    };
                    if let Err(e) = ctx.spawn(stream, permit, wait_group.clone()) {
                        tracing::error!("Failed to start handler for {}: {}", peer, e);
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    shutdown.wait_timeout(ACCEPT_POLL_INTERVAL);
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("Failed to accept connection: {}", e);
                    shutdown.wait_timeout(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        drop(listener);
        tracing::info!(
            "Listener closed, waiting for {} connection(s)",
            registry.len()
        );

        registry.close_all();
        wait_group.wait();

        tracing::info!("All connections closed");
        Ok(())
    }
}

/// What a handler thread needs besides the socket
struct ConnectionContext<'a> {
    id: u64,
    peer: SocketAddr,
    router: Arc<Router>,
    config: &'a Config,
    registry: &'a Arc<ConnectionRegistry>,
    shutdown: &'a Shutdown,
}

impl ConnectionContext<'_> {
    fn spawn(self, stream: TcpStream, permit: Permit, wait_group: WaitGroup) -> Result<()> {
        // Accepted sockets must block; timeouts come from the idle settings
        stream.set_nonblocking(false)?;

        let registration = Registration::new(self.registry, self.id, stream.try_clone()?);
        let mut connection =
            Connection::new(stream, self.router, self.config, self.shutdown.clone())?;
        let peer = self.peer;

        thread::Builder::new()
            .name(format!("conn-{}", self.id))
            .spawn(move || {
                let _permit = permit;
                let _wait_group = wait_group;
                let _registration = registration;

                match panic::catch_unwind(AssertUnwindSafe(|| connection.handle())) {
                    Ok(Ok(())) => tracing::debug!("Connection {} closed", peer),
                    Ok(Err(e)) => tracing::warn!("Connection {} closed with error: {}", peer, e),
                    Err(payload) => tracing::error!(
                        "Handler for {} panicked: {}",
                        peer,
                        panic_message(&*payload)
                    ),
                }

                // Close the socket before the permit and wait group are released
                drop(connection);
            })?;

        Ok(())
    }
}

/// Tell a refused client why and close the socket
fn reject(mut stream: TcpStream) {
    let _ = stream.set_nonblocking(false);
    let _ = stream.set_write_timeout(Some(Duration::from_secs(1)));
    let _ = stream.write_all(REJECTION_MESSAGE);
    let _ = stream.shutdown(SocketShutdown::Both);
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

// =============================================================================
// Connection Registry
// =============================================================================

/// Live client sockets, so shutdown can wake handlers blocked in `read`
#[derive(Default)]
struct ConnectionRegistry {
    streams: Mutex<HashMap<u64, TcpStream>>,
}

impl ConnectionRegistry {
    fn len(&self) -> usize {
        self.streams.lock().len()
    }

    fn close_all(&self) {
        for stream in self.streams.lock().values() {
            let _ = stream.shutdown(SocketShutdown::Both);
        }
    }
}

/// Keeps a socket registered for as long as its handler runs
struct Registration {
    registry: Arc<ConnectionRegistry>,
    id: u64,
}

impl Registration {
    fn new(registry: &Arc<ConnectionRegistry>, id: u64, stream: TcpStream) -> Self {
        registry.streams.lock().insert(id, stream);
        Self {
            registry: Arc::clone(registry),
            id,
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.streams.lock().remove(&self.id);
    }
}
