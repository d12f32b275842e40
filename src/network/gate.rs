//! Admission gate
//!
//! Counting semaphore bounding the number of connections served at once.
//! Acquisition never blocks: a full gate rejects immediately.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Non-blocking counting semaphore
#[derive(Debug)]
pub struct AdmissionGate {
    capacity: usize,
    available: AtomicUsize,
}

/// One admitted connection. Releases its slot on drop.
#[derive(Debug)]
pub struct Permit {
    gate: Arc<AdmissionGate>,
}

impl AdmissionGate {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            capacity,
            available: AtomicUsize::new(capacity),
        })
    }

    /// Take a slot if one is free
    pub fn try_acquire(self: &Arc<Self>) -> Option<Permit> {
        self.available
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .ok()
            .map(|_| Permit {
                gate: Arc::clone(self),
            })
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.available.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.gate.available.fetch_add(1, Ordering::AcqRel);
    }
}
