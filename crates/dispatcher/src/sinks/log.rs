//! LogSink - logs batch summaries via tracing

use contracts::{AuditEvent, ContractError, EventSink, Severity};
use tracing::{debug, info, instrument};

/// Sink that only logs, for dry runs and local debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_batch_summary(&self, batch: &[AuditEvent]) {
        let highest = batch
            .iter()
            .map(|e| e.severity)
            .max()
            .unwrap_or(Severity::Low);
        let critical = batch
            .iter()
            .filter(|e| e.severity == Severity::Critical)
            .count();

        info!(
            sink = %self.name,
            events = batch.len(),
            highest_severity = %highest,
            critical,
            "Batch received"
        );

        for event in batch {
            debug!(
                sink = %self.name,
                event_id = %event.id,
                event_type = %event.event_type,
                severity = %event.severity,
                ip = %event.ip_address,
                "Event"
            );
        }
    }
}

impl EventSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, batch),
        fields(sink = %self.name, events = batch.len())
    )]
    async fn write_batch(&mut self, batch: &[AuditEvent]) -> Result<(), ContractError> {
        self.log_batch_summary(batch);
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
