//! Ingestion metrics
//!
//! Prometheus recorders for the submit path and the flush loop, plus an
//! in-memory aggregator the consumer loop uses to report a summary on shutdown.

use metrics::{counter, gauge, histogram};

/// Outcome label for `record_submission`
pub const OUTCOME_ACCEPTED: &str = "accepted";
pub const OUTCOME_BUFFER_FULL: &str = "buffer_full";
pub const OUTCOME_SHUTTING_DOWN: &str = "shutting_down";

/// Reason label for `record_events_dropped`
pub const DROP_SINK_FAILURE: &str = "sink_failure";
pub const DROP_DRAIN_TIMEOUT: &str = "drain_timeout";

/// Record one `submit` call
pub fn record_submission(outcome: &'static str) {
    counter!("audit_ingest_events_submitted_total", "outcome" => outcome).increment(1);
}

/// Record an event rejected by ingress validation
pub fn record_invalid_event(field: &str) {
    counter!(
        "audit_ingest_events_invalid_total",
        "field" => field.to_string()
    )
    .increment(1);
}

/// Record a committed batch
pub fn record_batch_written(sink_name: &str, size: usize, latency_ms: f64) {
    counter!(
        "audit_ingest_batches_written_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
    counter!(
        "audit_ingest_events_written_total",
        "sink" => sink_name.to_string()
    )
    .increment(size as u64);
    histogram!("audit_ingest_batch_size").record(size as f64);
    histogram!("audit_ingest_flush_latency_ms").record(latency_ms);
}

/// Record a failed batch
pub fn record_batch_failed(sink_name: &str, size: usize) {
    counter!(
        "audit_ingest_batches_failed_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
    record_events_dropped(DROP_SINK_FAILURE, size);
}

/// Record accepted events that will never be persisted
pub fn record_events_dropped(reason: &'static str, count: usize) {
    if count > 0 {
        counter!("audit_ingest_events_dropped_total", "reason" => reason).increment(count as u64);
    }
}

/// Record queue occupancy
pub fn record_queue_depth(depth: usize, capacity: usize) {
    gauge!("audit_ingest_queue_depth").set(depth as f64);
    gauge!("audit_ingest_queue_capacity").set(capacity as f64);
}

/// Flush statistics aggregator
///
/// Owned by the consumer loop; no synchronization needed.
#[derive(Debug, Clone, Default)]
pub struct FlushStatsAggregator {
    /// Batches committed
    pub batches_written: u64,

    /// Events committed
    pub events_written: u64,

    /// Batches the sink rejected
    pub batches_failed: u64,

    /// Events lost with failed batches
    pub events_failed: u64,

    /// Events still queued when the drain deadline passed
    pub events_abandoned: u64,

    /// Flushes by trigger
    pub size_flushes: u64,
    pub interval_flushes: u64,
    pub shutdown_flushes: u64,

    /// Committed batch size
    pub batch_size_stats: RunningStats,

    /// Sink write latency (ms), successes and failures
    pub latency_stats: RunningStats,
}

/// What caused a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// Batch reached `batch_size`
    Size,
    /// Flush interval elapsed
    Interval,
    /// Final flush on shutdown
    Shutdown,
}

impl FlushTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlushTrigger::Size => "size",
            FlushTrigger::Interval => "interval",
            FlushTrigger::Shutdown => "shutdown",
        }
    }
}

impl FlushStatsAggregator {
    /// Create new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sink write attempt
    pub fn record(&mut self, trigger: FlushTrigger, size: usize, latency_ms: f64, success: bool) {
        match trigger {
            FlushTrigger::Size => self.size_flushes += 1,
            FlushTrigger::Interval => self.interval_flushes += 1,
            FlushTrigger::Shutdown => self.shutdown_flushes += 1,
        }
        self.latency_stats.push(latency_ms);

        if success {
            self.batches_written += 1;
            self.events_written += size as u64;
            self.batch_size_stats.push(size as f64);
        } else {
            self.batches_failed += 1;
            self.events_failed += size as u64;
        }
    }

    /// Record events given up on at shutdown
    pub fn record_abandoned(&mut self, count: usize) {
        self.events_abandoned += count as u64;
    }

    /// Generate summary report
    pub fn summary(&self) -> FlushSummary {
        let attempted = self.events_written + self.events_failed;
        FlushSummary {
            batches_written: self.batches_written,
            events_written: self.events_written,
            batches_failed: self.batches_failed,
            events_failed: self.events_failed,
            events_abandoned: self.events_abandoned,
            failure_rate: if attempted > 0 {
                self.events_failed as f64 / attempted as f64 * 100.0
            } else {
                0.0
            },
            size_flushes: self.size_flushes,
            interval_flushes: self.interval_flushes,
            shutdown_flushes: self.shutdown_flushes,
            batch_size: StatsSummary::from(&self.batch_size_stats),
            flush_latency_ms: StatsSummary::from(&self.latency_stats),
        }
    }
}

/// Flush summary
#[derive(Debug, Clone, Default)]
pub struct FlushSummary {
    pub batches_written: u64,
    pub events_written: u64,
    pub batches_failed: u64,
    pub events_failed: u64,
    pub events_abandoned: u64,
    pub failure_rate: f64,
    pub size_flushes: u64,
    pub interval_flushes: u64,
    pub shutdown_flushes: u64,
    pub batch_size: StatsSummary,
    pub flush_latency_ms: StatsSummary,
}

impl std::fmt::Display for FlushSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Flush Summary ===")?;
        writeln!(
            f,
            "Batches written: {} ({} events)",
            self.batches_written, self.events_written
        )?;
        writeln!(
            f,
            "Batches failed: {} ({} events, {:.2}%)",
            self.batches_failed, self.events_failed, self.failure_rate
        )?;
        writeln!(f, "Abandoned on shutdown: {}", self.events_abandoned)?;
        writeln!(
            f,
            "Triggers: size={}, interval={}, shutdown={}",
            self.size_flushes, self.interval_flushes, self.shutdown_flushes
        )?;
        writeln!(f, "Batch size: {}", self.batch_size)?;
        writeln!(f, "Flush latency (ms): {}", self.flush_latency_ms)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
