//! Dispatcher counters shared between handles and the consumer task

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters for one dispatcher
#[derive(Debug, Default)]
pub struct DispatcherMetrics {
    /// Events accepted by `submit`
    accepted: AtomicU64,
    /// Submits refused because the queue was full
    rejected_full: AtomicU64,
    /// Submits refused after shutdown began
    rejected_shutdown: AtomicU64,
    /// Batches committed by the sink
    batches_written: AtomicU64,
    /// Events committed by the sink
    events_written: AtomicU64,
    /// Batches the sink rejected
    batches_failed: AtomicU64,
    /// Accepted events that will never be persisted
    events_dropped: AtomicU64,
}

impl DispatcherMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn inc_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rejected_full(&self) -> u64 {
        self.rejected_full.load(Ordering::Relaxed)
    }

    pub fn inc_rejected_full(&self) {
        self.rejected_full.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rejected_shutdown(&self) -> u64 {
        self.rejected_shutdown.load(Ordering::Relaxed)
    }

    pub fn inc_rejected_shutdown(&self) {
        self.rejected_shutdown.fetch_add(1, Ordering::Relaxed);
    }

    pub fn batches_written(&self) -> u64 {
        self.batches_written.load(Ordering::Relaxed)
    }

    pub fn events_written(&self) -> u64 {
        self.events_written.load(Ordering::Relaxed)
    }

    /// Record a committed batch
    pub fn add_written(&self, events: usize) {
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.events_written.fetch_add(events as u64, Ordering::Relaxed);
    }

    pub fn batches_failed(&self) -> u64 {
        self.batches_failed.load(Ordering::Relaxed)
    }

    /// Record a failed batch; its events count as dropped
    pub fn add_failed(&self, events: usize) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
        self.add_dropped(events);
    }

    pub fn events_dropped(&self) -> u64 {
        self.events_dropped.load(Ordering::Relaxed)
    }

    pub fn add_dropped(&self, events: usize) {
        self.events_dropped.fetch_add(events as u64, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            accepted: self.accepted(),
            rejected_full: self.rejected_full(),
            rejected_shutdown: self.rejected_shutdown(),
            batches_written: self.batches_written(),
            events_written: self.events_written(),
            batches_failed: self.batches_failed(),
            events_dropped: self.events_dropped(),
        }
    }
}

/// Snapshot of dispatcher metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub accepted: u64,
    pub rejected_full: u64,
    pub rejected_shutdown: u64,
    pub batches_written: u64,
    pub events_written: u64,
    pub batches_failed: u64,
    pub events_dropped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_batch_counts_as_dropped() {
        let metrics = DispatcherMetrics::new();
        metrics.add_written(10);
        metrics.add_failed(4);
        metrics.add_dropped(1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.batches_written, 1);
        assert_eq!(snapshot.events_written, 10);
        assert_eq!(snapshot.batches_failed, 1);
        assert_eq!(snapshot.events_dropped, 5);
    }
}
