//! # walkv
//!
//! An in-memory key-value store with:
//! - A line-oriented text protocol over TCP (`SET`, `GET`, `DEL`, `help`, `exit`)
//! - Bounded admission of client connections
//! - Batched Write-Ahead Logging (WAL) for mutating commands
//! - Rotating, fsync'd append-only segment files
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                             │
//! │        (Admission Gate, one thread per connection)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Command Router                            │
//! │          (Parser + Dispatch Table, log-then-apply)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ WAL Service │          │   Engine    │
//!   │  (Batcher)  │          │  (RwLock)   │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │  Segments   │
//!   │ (wal.log.*) │
//!   └─────────────┘
//! ```
//!
//! The WAL is write-only: state is never rebuilt from it on restart.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod shutdown;

pub mod engine;
pub mod protocol;
pub mod router;
pub mod wal;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::Config;
pub use engine::Engine;
pub use router::Router;
pub use shutdown::{Shutdown, ShutdownTrigger};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of walkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
