//! Write-Ahead Log (WAL) Module
//!
//! Records every durable command before it is applied in memory.
//!
//! ## Responsibilities
//! - Serialize durable commands into newline-terminated records
//! - Batch records by count or time on a single worker thread
//! - Append batches to size-bounded segment files, fsync'ing each write
//!
//! ## File Layout
//! ```text
//! {data_dir}/
//!   ├── wal.log               first segment
//!   ├── wal.log.1718000000    rotated segment
//!   └── wal.log.1718000042    rotated segment
//!
//! each segment:
//!   SET a 1\n
//!   DEL a\n
//!   ...
//! ```
//!
//! There is no checksum, index or replay: the log is written, never read back.

mod record;
mod segment;
mod service;

pub use record::Record;
pub use segment::SegmentWriter;
pub use service::{WalHandle, WalService, WalSink};
