//! BufferedDispatcher - bounded queue in front of a single batching writer
//!
//! Producers call [`DispatcherHandle::submit`], which never blocks. One
//! consumer task owns the sink and flushes the local batch when it reaches
//! `batch_size`, when the flush interval elapses, or on shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use contracts::{AuditEvent, DispatcherSettings, EventSink};
use observability::metrics::{
    self as obs, FlushStatsAggregator, FlushSummary, FlushTrigger, DROP_DRAIN_TIMEOUT,
    OUTCOME_ACCEPTED, OUTCOME_BUFFER_FULL, OUTCOME_SHUTTING_DOWN,
};

use crate::error::{DispatcherError, SubmitError};
use crate::metrics::DispatcherMetrics;

/// Queue and flush policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Maximum number of queued events
    pub queue_capacity: usize,
    /// Flush as soon as the batch holds this many events
    pub batch_size: usize,
    /// Flush at least this often when events are pending
    pub flush_interval: Duration,
    /// Upper bound for the final drain on shutdown
    pub drain_timeout: Duration,
}

impl DispatcherConfig {
    fn validate(&self) -> Result<(), DispatcherError> {
        if self.queue_capacity == 0 {
            return Err(DispatcherError::InvalidConfig(
                "queue_capacity must be at least 1".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(DispatcherError::InvalidConfig(
                "batch_size must be at least 1".into(),
            ));
        }
        if self.flush_interval.is_zero() {
            return Err(DispatcherError::InvalidConfig(
                "flush_interval must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

impl From<&DispatcherSettings> for DispatcherConfig {
    fn from(settings: &DispatcherSettings) -> Self {
        Self {
            queue_capacity: settings.queue_capacity,
            batch_size: settings.batch_size,
            flush_interval: settings.flush_interval(),
            drain_timeout: settings.drain_timeout(),
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::from(&DispatcherSettings::default())
    }
}

/// Producer side of the dispatcher
///
/// Cheap to clone; every ingress task holds one.
#[derive(Clone)]
pub struct DispatcherHandle {
    tx: mpsc::Sender<AuditEvent>,
    metrics: Arc<DispatcherMetrics>,
    capacity: usize,
}

impl DispatcherHandle {
    /// Enqueue an event without waiting
    ///
    /// `Ok(())` means the event is queued; it may still be lost if the sink
    /// later fails its batch.
    pub fn submit(&self, event: AuditEvent) -> Result<(), SubmitError> {
        match self.tx.try_send(event) {
            Ok(()) => {
                self.metrics.inc_accepted();
                obs::record_submission(OUTCOME_ACCEPTED);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.metrics.inc_rejected_full();
                obs::record_submission(OUTCOME_BUFFER_FULL);
                debug!(
                    event_id = %event.id,
                    capacity = self.capacity,
                    "Buffer full, event rejected"
                );
                Err(SubmitError::BufferFull {
                    capacity: self.capacity,
                })
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                self.metrics.inc_rejected_shutdown();
                obs::record_submission(OUTCOME_SHUTTING_DOWN);
                debug!(event_id = %event.id, "Dispatcher closed, event rejected");
                Err(SubmitError::ShuttingDown)
            }
        }
    }

    /// Events currently queued (not yet taken by the consumer)
    pub fn queue_len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn queue_capacity(&self) -> usize {
        self.capacity
    }

    /// Queue occupancy in percent
    pub fn usage_percent(&self) -> f64 {
        self.queue_len() as f64 / self.capacity as f64 * 100.0
    }

    /// True once the consumer stopped accepting events
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn metrics(&self) -> &Arc<DispatcherMetrics> {
        &self.metrics
    }
}

/// Owner of the consumer task
pub struct BufferedDispatcher {
    handle: DispatcherHandle,
    shutdown_tx: watch::Sender<bool>,
    worker: JoinHandle<FlushSummary>,
    sink_name: String,
}

impl BufferedDispatcher {
    /// Start the consumer task; must be called inside a Tokio runtime
    #[instrument(
        name = "dispatcher_spawn",
        skip(sink, config),
        fields(
            sink = %sink.name(),
            queue_capacity = config.queue_capacity,
            batch_size = config.batch_size
        )
    )]
    pub fn spawn<S>(sink: S, config: DispatcherConfig) -> Result<Self, DispatcherError>
    where
        S: EventSink + Send + 'static,
    {
        config.validate()?;

        let sink_name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let metrics = Arc::new(DispatcherMetrics::new());

        let handle = DispatcherHandle {
            tx,
            metrics: Arc::clone(&metrics),
            capacity: config.queue_capacity,
        };

        let worker = Worker {
            sink,
            sink_name: sink_name.clone(),
            rx,
            shutdown_rx,
            batch: Vec::with_capacity(config.batch_size),
            config,
            metrics,
            stats: FlushStatsAggregator::new(),
        };
        let worker = tokio::spawn(worker.run());

        info!(sink = %sink_name, "Dispatcher started");

        Ok(Self {
            handle,
            shutdown_tx,
            worker,
            sink_name,
        })
    }

    /// New producer handle
    pub fn handle(&self) -> DispatcherHandle {
        self.handle.clone()
    }

    pub fn metrics(&self) -> &Arc<DispatcherMetrics> {
        &self.handle.metrics
    }

    pub fn sink_name(&self) -> &str {
        &self.sink_name
    }

    /// Stop accepting events, flush what is pending and wait for the consumer
    #[instrument(name = "dispatcher_shutdown", skip(self), fields(sink = %self.sink_name))]
    pub async fn shutdown(self) -> Result<FlushSummary, DispatcherError> {
        // Err only means the worker already exited
        let _ = self.shutdown_tx.send(true);

        let summary = self.worker.await?;

        info!(
            sink = %self.sink_name,
            events_written = summary.events_written,
            events_failed = summary.events_failed,
            events_abandoned = summary.events_abandoned,
            "Dispatcher shutdown complete"
        );
        Ok(summary)
    }
}

/// Consumer task state
struct Worker<S> {
    sink: S,
    sink_name: String,
    rx: mpsc::Receiver<AuditEvent>,
    shutdown_rx: watch::Receiver<bool>,
    batch: Vec<AuditEvent>,
    config: DispatcherConfig,
    metrics: Arc<DispatcherMetrics>,
    stats: FlushStatsAggregator,
}

impl<S: EventSink> Worker<S> {
    #[instrument(name = "dispatcher_worker_loop", skip(self), fields(sink = %self.sink_name))]
    async fn run(mut self) -> FlushSummary {
        let period = self.config.flush_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    debug!(sink = %self.sink_name, "Shutdown signal received");
                    break;
                }
                received = self.rx.recv() => match received {
                    Some(event) => {
                        self.batch.push(event);
                        if self.batch.len() >= self.config.batch_size {
                            self.flush(FlushTrigger::Size).await;
                            ticker.reset();
                        }
                    }
                    None => {
                        debug!(sink = %self.sink_name, "All producers dropped");
                        break;
                    }
                },
                _ = ticker.tick() => {
                    self.flush(FlushTrigger::Interval).await;
                    ticker.reset();
                }
            }
        }

        self.drain().await;

        if let Err(e) = self.sink.close().await {
            error!(sink = %self.sink_name, error = %e, "Close failed on shutdown");
        }

        debug!(sink = %self.sink_name, "Dispatcher worker stopped");
        self.stats.summary()
    }

    /// Write the current batch; the batch is cleared whatever the outcome
    async fn flush(&mut self, trigger: FlushTrigger) {
        if self.batch.is_empty() {
            return;
        }

        let size = self.batch.len();
        let started = Instant::now();
        let result = self.sink.write_batch(&self.batch).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(()) => {
                self.metrics.add_written(size);
                obs::record_batch_written(&self.sink_name, size, latency_ms);
                self.stats.record(trigger, size, latency_ms, true);
                info!(
                    sink = %self.sink_name,
                    events = size,
                    trigger = trigger.as_str(),
                    latency_ms,
                    "Batch written"
                );
            }
            Err(e) => {
                self.metrics.add_failed(size);
                obs::record_batch_failed(&self.sink_name, size);
                self.stats.record(trigger, size, latency_ms, false);
                error!(
                    sink = %self.sink_name,
                    events = size,
                    trigger = trigger.as_str(),
                    error = %e,
                    "Batch write failed, events dropped"
                );
            }
        }

        self.batch.clear();
        obs::record_queue_depth(self.rx.len(), self.config.queue_capacity);
    }

    /// Close the queue and flush everything already accepted
    async fn drain(&mut self) {
        self.rx.close();

        debug!(
            sink = %self.sink_name,
            batched = self.batch.len(),
            queued = self.rx.len(),
            "Draining dispatcher"
        );

        let deadline = self.config.drain_timeout;
        if timeout(deadline, self.drain_queue()).await.is_err() {
            let lost = self.batch.len() + self.discard_queue();
            self.batch.clear();

            self.metrics.add_dropped(lost);
            obs::record_events_dropped(DROP_DRAIN_TIMEOUT, lost);
            self.stats.record_abandoned(lost);
            warn!(
                sink = %self.sink_name,
                lost,
                timeout_ms = deadline.as_millis() as u64,
                "Drain timed out, pending events lost"
            );
        }
    }

    /// Flush the batch plus queued events in chunks of at most `batch_size`
    async fn drain_queue(&mut self) {
        loop {
            while self.batch.len() < self.config.batch_size {
                match self.rx.try_recv() {
                    Ok(event) => self.batch.push(event),
                    Err(_) => break,
                }
            }
            if self.batch.is_empty() {
                break;
            }
            self.flush(FlushTrigger::Shutdown).await;
        }
    }

    fn discard_queue(&mut self) -> usize {
        let mut count = 0;
        while self.rx.try_recv().is_ok() {
            count += 1;
        }
        count
    }
}
