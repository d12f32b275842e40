//! Engine Module
//!
//! The in-memory key-value store.
//!
//! ## Concurrency Model: Multiple-Reader / Single-Writer
//!
//! One `RwLock` guards the whole map:
//! - **Reads** (get/len): share the read lock, run in parallel
//! - **Writes** (set/delete): take the write lock, exclude everyone
//!
//! Engine operations never fail. Durability is handled one layer up by the
//! [`Router`](crate::router::Router), which logs mutations before applying them.

use std::collections::HashMap;

use parking_lot::RwLock;

/// The key-value storage engine
///
/// Created once at startup and shared as `Arc<Engine>` with every consumer.
/// State lives only in memory; nothing is loaded from the WAL on startup.
#[derive(Debug, Default)]
pub struct Engine {
    data: RwLock<HashMap<String, String>>,
}

impl Engine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key. `None` means the key is not present.
    pub fn get(&self, key: &str) -> Option<String> {
        self.data.read().get(key).cloned()
    }

    /// Insert or overwrite a key
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.data.write().insert(key.into(), value.into());
    }

    /// Remove a key. Removing a missing key is a no-op.
    pub fn delete(&self, key: &str) {
        self.data.write().remove(key);
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}
