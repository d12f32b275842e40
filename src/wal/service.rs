//! WAL batching service
//!
//! A single worker thread drains the ingestion queue, groups records into
//! batches and hands each full (or timed-out) batch to a [`WalSink`].
//!
//! ```text
//!  handlers ──submit──▶ [bounded queue] ──▶ wal-batcher ──write_batch──▶ sink
//!                                             ▲      ▲
//!                                     tick(timeout)  shutdown
//! ```
//!
//! Producers block while the queue is full. The worker does not read the
//! queue while a flush is in progress, so slow disks push back on clients.
//! On shutdown the pending batch is discarded, not flushed.

use std::mem;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, select, Receiver, Sender};

use crate::config::Config;
use crate::error::{KvError, Result};
use crate::shutdown::Shutdown;
use super::Record;

/// Destination of flushed batches
pub trait WalSink: Send + 'static {
    /// Durably write one record
    fn append(&mut self, record: &[u8]) -> Result<()>;

    /// Write a whole batch in order, stopping at the first failure
    fn write_batch(&mut self, batch: Vec<Record>) -> Result<()> {
        for record in &batch {
            self.append(record.as_bytes())?;
        }
        Ok(())
    }
}

/// Producer side of the ingestion queue
#[derive(Clone)]
pub struct WalHandle {
    sender: Sender<Record>,
}

impl WalHandle {
    /// Wrap the sending half of an ingestion queue
    pub fn new(sender: Sender<Record>) -> Self {
        Self { sender }
    }

    /// Enqueue a record, blocking while the queue is full
    ///
    /// Fails with [`KvError::WalClosed`] once the worker has exited.
    pub fn submit(&self, record: Record) -> Result<()> {
        self.sender.send(record).map_err(|_| KvError::WalClosed)
    }
}

/// The running batching service
pub struct WalService {
    handle: WalHandle,
    worker: JoinHandle<()>,
}

impl WalService {
    /// Start the worker with the WAL settings from `config`
    pub fn start<S: WalSink>(sink: S, config: &Config, shutdown: Shutdown) -> Result<Self> {
        Self::with_settings(
            sink,
            config.flush_batch_size,
            config.flush_batch_timeout,
            config.wal_queue_capacity,
            shutdown,
        )
    }

    /// Start the worker with explicit batch size, flush timeout and queue capacity
    pub fn with_settings<S: WalSink>(
        sink: S,
        batch_size: usize,
        batch_timeout: Duration,
        queue_capacity: usize,
        shutdown: Shutdown,
    ) -> Result<Self> {
        if batch_size == 0 || batch_timeout.is_zero() {
            return Err(KvError::Config(
                "WAL batch size and timeout must be positive".into(),
            ));
        }

        let (sender, receiver) = channel::bounded(queue_capacity);
        let batcher = Batcher {
            sink,
            batch: Vec::with_capacity(batch_size),
            batch_size,
        };

        let worker = thread::Builder::new()
            .name("wal-batcher".to_string())
            .spawn(move || batcher.run(receiver, shutdown, batch_timeout))?;

        tracing::info!(
            "WAL service started (batch_size={}, timeout={:?}, queue={})",
            batch_size,
            batch_timeout,
            queue_capacity
        );

        Ok(Self {
            handle: WalHandle::new(sender),
            worker,
        })
    }

    /// A producer handle for the ingestion queue
    pub fn handle(&self) -> WalHandle {
        self.handle.clone()
    }

    /// Wait for the worker to exit
    ///
    /// The worker stops when shutdown fires or once every handle is dropped.
    /// A flush already in progress completes first.
    pub fn join(self) {
        drop(self.handle);
        if self.worker.join().is_err() {
            tracing::error!("WAL worker panicked");
        }
        tracing::info!("WAL service stopped");
    }
}

/// State owned by the worker thread
struct Batcher<S> {
    sink: S,
    batch: Vec<Record>,
    batch_size: usize,
}

impl<S: WalSink> Batcher<S> {
    fn run(mut self, queue: Receiver<Record>, shutdown: Shutdown, timeout: Duration) {
        let ticker = channel::tick(timeout);

        loop {
            if shutdown.is_triggered() {
                self.discard();
                return;
            }

            select! {
                recv(shutdown.receiver()) -> _ => {
                    self.discard();
                    return;
                }
                recv(queue) -> msg => match msg {
                    Ok(record) => {
                        // Threshold is checked before the new record is added
                        if self.batch.len() >= self.batch_size {
                            self.flush();
                        }
                        self.batch.push(record);
                    }
                    Err(_) => {
                        // Every producer is gone; nothing else can arrive
                        self.flush();
                        return;
                    }
                },
                recv(ticker) -> _ => {
                    if !self.batch.is_empty() {
                        self.flush();
                    }
                }
            }
        }
    }

    fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }

        let batch = mem::replace(&mut self.batch, Vec::with_capacity(self.batch_size));
        let count = batch.len();

        match self.sink.write_batch(batch) {
            Ok(()) => tracing::debug!("Flushed {} WAL records", count),
            Err(e) => tracing::error!("WAL flush failed, dropping batch of {} records: {}", count, e),
        }
    }

    fn discard(&mut self) {
        if !self.batch.is_empty() {
            tracing::warn!(
                "Shutdown with {} unflushed WAL records; discarding",
                self.batch.len()
            );
            self.batch.clear();
        }
    }
}
