//! Segment writer
//!
//! Appends records to one active segment file and rotates to a new
//! `<base>.<unix_ts>` file when the next record would not fit.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;
use super::WalSink;

/// Writes records to size-bounded, append-only segment files
///
/// Owned by the WAL worker thread; it needs no internal locking.
pub struct SegmentWriter {
    /// Path of the first segment; rotated segments derive their names from it
    base_path: PathBuf,

    /// Path of the currently open segment
    active_path: PathBuf,

    /// Open handle of the active segment (append mode)
    file: File,

    max_segment_size: u64,

    /// Timestamp used by the most recent rotation
    last_rotation_ts: u64,

    rotations: u64,
}

impl SegmentWriter {
    /// Open or create the segment at `base_path`, creating parent directories
    pub fn open(base_path: impl Into<PathBuf>, max_segment_size: u64) -> Result<Self> {
        let base_path = base_path.into();
        if let Some(parent) = base_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = open_append(&base_path)?;
        tracing::debug!("Opened WAL segment {}", base_path.display());

        Ok(Self {
            active_path: base_path.clone(),
            base_path,
            file,
            max_segment_size,
            last_rotation_ts: 0,
            rotations: 0,
        })
    }

    /// Append one record and fsync it
    ///
    /// Rotates first if the active segment is non-empty and the record would
    /// push it past `max_segment_size`. A record is never split across files;
    /// one larger than the limit goes whole into an empty segment.
    pub fn append(&mut self, record: &[u8]) -> Result<()> {
        let size = self.file.metadata()?.len();

        if size > 0 && size + record.len() as u64 > self.max_segment_size {
            self.rotate()?;
        }

        self.file.write_all(record)?;
        self.file.sync_data()?;
        Ok(())
    }

    /// Close the active segment and open a fresh timestamp-named one
    fn rotate(&mut self) -> Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        // Two rotations in the same second must still get distinct names
        let mut ts = now.max(self.last_rotation_ts + 1);
        let mut path = segment_path(&self.base_path, ts);
        while path.exists() {
            ts += 1;
            path = segment_path(&self.base_path, ts);
        }

        // Open before swapping so a failure leaves the old segment active
        let file = open_append(&path)?;
        self.file = file;
        self.active_path = path;
        self.last_rotation_ts = ts;
        self.rotations += 1;

        tracing::info!("Rotated WAL to new segment {}", self.active_path.display());
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of the segment currently receiving appends
    pub fn active_path(&self) -> &Path {
        &self.active_path
    }

    /// Current size of the active segment on disk
    pub fn active_size(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Number of rotations performed since open
    pub fn rotations(&self) -> u64 {
        self.rotations
    }
}

impl WalSink for SegmentWriter {
    fn append(&mut self, record: &[u8]) -> Result<()> {
        SegmentWriter::append(self, record)
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn segment_path(base: &Path, ts: u64) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(format!(".{}", ts));
    PathBuf::from(name)
}
