//! Shutdown signal
//!
//! One process-wide cancellation signal. The trigger side fires once; every
//! clone of [`Shutdown`] observes it either by polling [`Shutdown::is_triggered`]
//! or by selecting on [`Shutdown::receiver`], which disconnects when fired.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

/// Fires the shutdown signal
///
/// Dropping the trigger fires it as well.
pub struct ShutdownTrigger {
    triggered: Arc<AtomicBool>,
    sender: Mutex<Option<Sender<()>>>,
}

/// Observes the shutdown signal
#[derive(Clone)]
pub struct Shutdown {
    triggered: Arc<AtomicBool>,
    receiver: Receiver<()>,
}

/// Create a connected trigger/observer pair
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (sender, receiver) = bounded(0);
    let triggered = Arc::new(AtomicBool::new(false));

    let trigger = ShutdownTrigger {
        triggered: Arc::clone(&triggered),
        sender: Mutex::new(Some(sender)),
    };
    let shutdown = Shutdown {
        triggered,
        receiver,
    };
    (trigger, shutdown)
}

impl ShutdownTrigger {
    /// Fire the signal. Idempotent.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
        // Dropping the only sender disconnects every receiver clone
        self.sender.lock().take();
    }
}

impl Drop for ShutdownTrigger {
    // Losing the trigger disconnects the receivers anyway; keep the flag in step
    fn drop(&mut self) {
        self.trigger();
    }
}

impl Shutdown {
    /// Whether the signal has fired
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Channel that becomes disconnected once the signal fires.
    /// Nothing is ever sent on it; use it inside `crossbeam::select!`.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }

    /// Block for up to `timeout`; returns true if the signal fired
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_triggered() {
            return true;
        }
        match self.receiver.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => self.is_triggered(),
            _ => true,
        }
    }
}
