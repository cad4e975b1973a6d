//! Sink metrics for observability

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Total successful writes
    write_count: AtomicU64,
    /// Total write failures
    failure_count: AtomicU64,
    /// Total outputs dropped due to full queue
    dropped_count: AtomicU64,
    /// Retained outputs that had to wait for queue space
    waited_count: AtomicU64,
    /// Tick id of the last successful write
    last_tick_id: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    pub fn inc_write_count(&self) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn inc_dropped_count(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn waited_count(&self) -> u64 {
        self.waited_count.load(Ordering::Relaxed)
    }

    pub fn inc_waited_count(&self) {
        self.waited_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn last_tick_id(&self) -> u64 {
        self.last_tick_id.load(Ordering::Relaxed)
    }

    pub fn set_last_tick_id(&self, tick_id: u64) {
        self.last_tick_id.fetch_max(tick_id, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            write_count: self.write_count(),
            failure_count: self.failure_count(),
            dropped_count: self.dropped_count(),
            waited_count: self.waited_count(),
            last_tick_id: self.last_tick_id(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub write_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
    pub waited_count: u64,
    pub last_tick_id: u64,
}

impl MetricsSnapshot {
    /// Share of offered outputs that were dropped, in percent
    pub fn drop_rate(&self) -> f64 {
        let offered = self.write_count + self.failure_count + self.dropped_count;
        if offered == 0 {
            0.0
        } else {
            self.dropped_count as f64 / offered as f64 * 100.0
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "written={}, failed={}, dropped={} ({:.2}%), waited={}, last_tick={}",
            self.write_count,
            self.failure_count,
            self.dropped_count,
            self.drop_rate(),
            self.waited_count,
            self.last_tick_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_drop_rate() {
        let metrics = SinkMetrics::new();
        for _ in 0..3 {
            metrics.inc_write_count();
        }
        metrics.inc_dropped_count();
        metrics.set_last_tick_id(9);
        metrics.set_last_tick_id(4);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.last_tick_id, 9);
        assert!((snapshot.drop_rate() - 25.0).abs() < 1e-9);
        assert!(snapshot.to_string().contains("dropped=1 (25.00%)"));
        assert_eq!(MetricsSnapshot::default().drop_rate(), 0.0);
    }
}
