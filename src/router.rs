//! Command Router
//!
//! Turns one raw request into one [`Response`]:
//! parse → resolve against the dispatch table → (log) → apply.
//!
//! ## Ordering: log-then-apply
//!
//! Durable commands run under `write_lock`. Inside it the record is submitted
//! to the WAL queue first and the engine is mutated only if submission
//! succeeded, so the WAL order always matches the in-memory apply order.
//! Submission only means "queued": disk failures later on are logged by the
//! WAL worker and never reach the client.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::Engine;
use crate::error::KvError;
use crate::protocol::{self, Command, Response};
use crate::wal::{Record, WalHandle};

/// Routes requests to the engine and the WAL
pub struct Router {
    engine: Arc<Engine>,

    /// Producer side of the WAL ingestion queue
    wal: WalHandle,

    /// Serializes durable commands (submit + apply)
    write_lock: Mutex<()>,
}

impl Router {
    pub fn new(engine: Arc<Engine>, wal: WalHandle) -> Self {
        Self {
            engine,
            wal,
            write_lock: Mutex::new(()),
        }
    }

    /// Handle one raw request
    pub fn handle(&self, request: &[u8]) -> Response {
        match std::str::from_utf8(request) {
            Ok(line) => self.handle_line(line),
            Err(e) => {
                let err = KvError::Protocol(format!("request is not valid UTF-8: {}", e));
                tracing::debug!("{}", err);
                Response::error(&err)
            }
        }
    }

    /// Handle one request line
    pub fn handle_line(&self, line: &str) -> Response {
        let parsed = protocol::parse(line);
        if parsed.is_empty() {
            tracing::trace!("Ignoring blank request");
            return Response::Empty;
        }

        let (command, spec) = match Command::resolve(parsed.command, &parsed.args) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Rejected request {:?}: {}", line.trim_end(), e);
                return Response::error(&e);
            }
        };

        // Extra arguments are ignored, so they are neither applied nor logged
        let args = &parsed.args[..spec.min_args];

        if !spec.durable {
            return (spec.handler)(&self.engine, args);
        }

        let _write_guard = self.write_lock.lock();

        let record = Record::encode(command.name(), args);
        if let Err(e) = self.wal.submit(record) {
            tracing::error!("Failed to log {}: {}", command.name(), e);
            return Response::error(&e);
        }

        (spec.handler)(&self.engine, args)
    }

    /// The engine this router applies commands to
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }
}
