//! Configuration for walkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{KvError, Result};

/// Main configuration for a walkv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrently served client connections
    pub max_connections: usize,

    /// Size of the per-connection read buffer (bytes). A single read that
    /// fills it completely is rejected as too large.
    pub max_message_size: usize,

    /// Idle timeout applied to every read. `None` disables it.
    pub idle_timeout: Option<Duration>,

    /// Apply the idle timeout to writes as well
    pub write_deadline: bool,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Root directory for WAL segments
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── wal.log              (active segment until first rotation)
    ///     └── wal.log.<unix_ts>    (rotated segments)
    pub data_dir: PathBuf,

    /// Max size of one segment file before rotation (in bytes)
    pub max_segment_size: u64,

    /// Number of records that triggers a batch flush
    pub flush_batch_size: usize,

    /// Max time a non-empty batch waits before being flushed
    pub flush_batch_timeout: Duration,

    /// Capacity of the WAL ingestion queue; producers block when it is full
    pub wal_queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3223".to_string(),
            max_connections: 100,
            max_message_size: 4 * 1024, // 4 KB
            idle_timeout: Some(Duration::from_secs(300)),
            write_deadline: true,
            data_dir: PathBuf::from("./walkv_data"),
            max_segment_size: 10 * 1024 * 1024, // 10 MB
            flush_batch_size: 100,
            flush_batch_timeout: Duration::from_millis(10),
            wal_queue_capacity: 1024,
        }
    }
}

impl Config {
    /// File name of the first segment inside `data_dir`
    pub const WAL_FILENAME: &'static str = "wal.log";

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Base path of the WAL segments
    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join(Self::WAL_FILENAME)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(KvError::Config("max_connections must be positive".into()));
        }
        if self.max_message_size == 0 {
            return Err(KvError::Config("max_message_size must be positive".into()));
        }
        if self.max_segment_size == 0 {
            return Err(KvError::Config("max_segment_size must be positive".into()));
        }
        if self.flush_batch_size == 0 {
            return Err(KvError::Config("flush_batch_size must be positive".into()));
        }
        if self.flush_batch_timeout.is_zero() {
            return Err(KvError::Config("flush_batch_timeout must be positive".into()));
        }
        if self.wal_queue_capacity == 0 {
            return Err(KvError::Config("wal_queue_capacity must be positive".into()));
        }
        if self.idle_timeout.is_some_and(|t| t.is_zero()) {
            return Err(KvError::Config(
                "idle_timeout must be positive (use None to disable)".into(),
            ));
        }
        Ok(())
    }
}

/// Parse a human readable size such as `4KB`, `10MB`, `1GB` or `512`.
///
/// Units are 1024-based and case-insensitive; a bare number is bytes.
pub fn parse_size(text: &str) -> Result<u64> {
    let text = text.trim();
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, unit) = text.split_at(split);

    if digits.is_empty() {
        return Err(KvError::Config(format!("invalid size: {:?}", text)));
    }
    let value: u64 = digits
        .parse()
        .map_err(|_| KvError::Config(format!("invalid size: {:?}", text)))?;

    let multiplier: u64 = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1 << 10,
        "M" | "MB" => 1 << 20,
        "G" | "GB" => 1 << 30,
        other => {
            return Err(KvError::Config(format!("unknown size unit: {:?}", other)));
        }
    };

    value
        .checked_mul(multiplier)
        .ok_or_else(|| KvError::Config(format!("size overflows: {:?}", text)))
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the per-connection read buffer size (in bytes)
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    /// Set the idle timeout (`None` disables it)
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Enable or disable the write deadline
    pub fn write_deadline(mut self, enabled: bool) -> Self {
        self.config.write_deadline = enabled;
        self
    }

    /// Set the data directory (root for WAL segments)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the segment size limit (in bytes)
    pub fn max_segment_size(mut self, size: u64) -> Self {
        self.config.max_segment_size = size;
        self
    }

    /// Set the number of records per WAL batch
    pub fn flush_batch_size(mut self, size: usize) -> Self {
        self.config.flush_batch_size = size;
        self
    }

    /// Set the WAL batch flush timeout
    pub fn flush_batch_timeout(mut self, timeout: Duration) -> Self {
        self.config.flush_batch_timeout = timeout;
        self
    }

    /// Set the WAL ingestion queue capacity
    pub fn wal_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.wal_queue_capacity = capacity;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
