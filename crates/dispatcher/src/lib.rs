//! # Dispatcher
//!
//! Buffered batch dispatcher for audit events.
//!
//! Responsibilities:
//! - Non-blocking `submit` into a bounded queue
//! - Single consumer that batches and flushes on size, interval or shutdown
//! - Sinks (Postgres / file / log) and the health probe

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod sinks;

pub use contracts::{AuditEvent, EventSink};
pub use dispatcher::{BufferedDispatcher, DispatcherConfig, DispatcherHandle};
pub use error::{DispatcherError, SubmitError};
pub use metrics::{DispatcherMetrics, MetricsSnapshot};
pub use observability::FlushSummary;
pub use sinks::{create_sink, AnySink, FileSink, LogSink, PostgresSink, SinkProbe};
