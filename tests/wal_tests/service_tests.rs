//! Tests for the WAL batching service
//!
//! These tests verify:
//! - Size-triggered flushes
//! - Timer-triggered flushes
//! - Submission order is preserved across batches
//! - Shutdown discards the pending batch
//! - Flush failures drop the batch without stopping the worker
//! - End-to-end flushing into segment files

use std::fs;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use tempfile::TempDir;
use walkv::error::{KvError, Result};
use walkv::shutdown;
use walkv::wal::{Record, SegmentWriter, WalService, WalSink};

// =============================================================================
// Helper Functions
// =============================================================================

/// Forwards every flushed batch to the test thread
struct CaptureSink {
    batches: Sender<Vec<String>>,
}

impl WalSink for CaptureSink {
    fn append(&mut self, record: &[u8]) -> Result<()> {
        let _ = self
            .batches
            .send(vec![String::from_utf8_lossy(record).into_owned()]);
        Ok(())
    }

    fn write_batch(&mut self, batch: Vec<Record>) -> Result<()> {
        let batch = batch
            .into_iter()
            .map(|r| String::from_utf8_lossy(r.as_bytes()).into_owned())
            .collect();
        let _ = self.batches.send(batch);
        Ok(())
    }
}

/// Fails on every record containing "bad"
struct FlakySink {
    written: Sender<String>,
}

impl WalSink for FlakySink {
    fn append(&mut self, record: &[u8]) -> Result<()> {
        let text = String::from_utf8_lossy(record).into_owned();
        if text.contains("bad") {
            return Err(KvError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk on fire",
            )));
        }
        let _ = self.written.send(text);
        Ok(())
    }
}

fn record(i: usize) -> Record {
    let key = format!("k{}", i);
    Record::encode("SET", &[key.as_str(), "v"])
}

fn start_capture(
    batch_size: usize,
    timeout: Duration,
) -> (WalService, Receiver<Vec<String>>, walkv::ShutdownTrigger) {
    let (sender, receiver) = channel::unbounded();
    let (trigger, shutdown) = shutdown::channel();
    let service = WalService::with_settings(
        CaptureSink { batches: sender },
        batch_size,
        timeout,
        64,
        shutdown,
    )
    .unwrap();
    (service, receiver, trigger)
}

// =============================================================================
// Batching Tests
// =============================================================================

#[test]
fn test_size_threshold_flushes_exactly_n() {
    let (service, batches, trigger) = start_capture(4, Duration::from_secs(30));
    let wal = service.handle();

    for i in 0..5 {
        wal.submit(record(i)).unwrap();
    }

    let first = batches.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(first.len(), 4);
    assert_eq!(first[0], "SET k0 v\n");
    assert_eq!(first[3], "SET k3 v\n");

    // The fifth record started a new batch that is still pending
    assert!(batches.recv_timeout(Duration::from_millis(200)).is_err());

    trigger.trigger();
    service.join();
}

#[test]
fn test_timeout_flushes_pending_records_once() {
    let (service, batches, trigger) = start_capture(10, Duration::from_millis(100));
    let wal = service.handle();

    for i in 0..3 {
        wal.submit(record(i)).unwrap();
    }

    let flushed = batches.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(flushed, vec!["SET k0 v\n", "SET k1 v\n", "SET k2 v\n"]);

    // Empty batches are never flushed on later ticks
    assert!(batches.recv_timeout(Duration::from_millis(350)).is_err());

    trigger.trigger();
    service.join();
}

#[test]
fn test_order_preserved_across_batches() {
    let (service, batches, trigger) = start_capture(3, Duration::from_millis(50));
    let wal = service.handle();

    for i in 0..10 {
        wal.submit(record(i)).unwrap();
    }

    let mut seen = Vec::new();
    while seen.len() < 10 {
        let batch = batches.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(batch.len() <= 3);
        seen.extend(batch);
    }

    let expected: Vec<String> = (0..10).map(|i| format!("SET k{} v\n", i)).collect();
    assert_eq!(seen, expected);

    trigger.trigger();
    service.join();
}

// =============================================================================
// Shutdown Tests
// =============================================================================

#[test]
fn test_shutdown_discards_unflushed_batch() {
    let (service, batches, trigger) = start_capture(10, Duration::from_secs(30));
    let wal = service.handle();

    for i in 0..3 {
        wal.submit(record(i)).unwrap();
    }

    trigger.trigger();
    service.join();

    assert!(batches.try_recv().is_err());
}

#[test]
fn test_submit_fails_after_worker_exit() {
    let (service, _batches, trigger) = start_capture(10, Duration::from_secs(30));
    let wal = service.handle();

    trigger.trigger();
    service.join();

    assert!(matches!(wal.submit(record(0)), Err(KvError::WalClosed)));
}

#[test]
fn test_dropped_trigger_is_seen_as_shutdown() {
    let (service, batches, trigger) = start_capture(10, Duration::from_secs(30));
    let wal = service.handle();
    wal.submit(record(0)).unwrap();

    let (other_trigger, observer) = shutdown::channel();
    drop(trigger);
    drop(other_trigger);

    // Flag and channel agree once the trigger is gone
    assert!(observer.is_triggered());
    assert!(observer.wait_timeout(Duration::from_millis(10)));

    service.join();
    assert!(batches.try_recv().is_err());
    assert!(matches!(wal.submit(record(1)), Err(KvError::WalClosed)));
}

#[test]
fn test_dropping_all_handles_flushes_and_stops() {
    let (service, batches, _trigger) = start_capture(10, Duration::from_secs(30));
    let wal = service.handle();

    wal.submit(record(0)).unwrap();
    wal.submit(record(1)).unwrap();
    drop(wal);

    service.join();

    let flushed = batches.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(flushed, vec!["SET k0 v\n", "SET k1 v\n"]);
}

#[test]
fn test_rejects_zero_batch_size() {
    let (sender, _receiver) = channel::unbounded();
    let (_trigger, shutdown) = shutdown::channel();

    let result = WalService::with_settings(
        CaptureSink { batches: sender },
        0,
        Duration::from_millis(10),
        8,
        shutdown,
    );

    assert!(matches!(result, Err(KvError::Config(_))));
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_failed_flush_drops_rest_of_batch_and_continues() {
    let (sender, written) = channel::unbounded();
    let (trigger, shutdown) = shutdown::channel();
    let service = WalService::with_settings(
        FlakySink { written: sender },
        3,
        Duration::from_millis(300),
        16,
        shutdown,
    )
    .unwrap();
    let wal = service.handle();

    wal.submit(Record::encode("SET", &["a", "1"])).unwrap();
    wal.submit(Record::encode("SET", &["bad", "2"])).unwrap();
    wal.submit(Record::encode("SET", &["c", "3"])).unwrap();

    assert_eq!(
        written.recv_timeout(Duration::from_secs(2)).unwrap(),
        "SET a 1\n"
    );
    // "c" followed the failing record in the same batch: dropped, not retried
    assert!(written.recv_timeout(Duration::from_millis(500)).is_err());

    // The worker keeps serving later batches
    wal.submit(Record::encode("SET", &["d", "4"])).unwrap();
    assert_eq!(
        written.recv_timeout(Duration::from_secs(2)).unwrap(),
        "SET d 4\n"
    );

    trigger.trigger();
    service.join();
}

// =============================================================================
// Disk Integration Tests
// =============================================================================

#[test]
fn test_flushes_into_segment_files() {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("wal.log");
    let writer = SegmentWriter::open(&wal_path, 1024).unwrap();
    let (_trigger, shutdown) = shutdown::channel();

    let service =
        WalService::with_settings(writer, 2, Duration::from_millis(20), 16, shutdown).unwrap();
    let wal = service.handle();

    wal.submit(Record::encode("SET", &["a", "1"])).unwrap();
    wal.submit(Record::encode("SET", &["b", "2"])).unwrap();
    wal.submit(Record::encode("DEL", &["a"])).unwrap();
    drop(wal);
    service.join();

    assert_eq!(
        fs::read_to_string(&wal_path).unwrap(),
        "SET a 1\nSET b 2\nDEL a\n"
    );
}
