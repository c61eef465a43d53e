//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Rejected dispatcher configuration
    #[error("invalid dispatcher config: {0}")]
    InvalidConfig(String),

    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Sink unreachable or probe timed out
    #[error("sink '{name}' unreachable: {message}")]
    Probe { name: String, message: String },

    /// Consumer task panicked or was cancelled
    #[error("dispatcher worker failed: {0}")]
    WorkerJoin(#[from] tokio::task::JoinError),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a probe error
    pub fn probe(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Probe {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Why `submit` refused an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Queue at capacity
    #[error("buffer full ({capacity} events queued)")]
    BufferFull { capacity: usize },

    /// Consumer stopped accepting events
    #[error("dispatcher is shutting down")]
    ShuttingDown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DispatcherError::probe("events", "connection refused");
        assert_eq!(err.to_string(), "sink 'events' unreachable: connection refused");

        let err = DispatcherError::sink_creation("jsonl", "missing 'path' parameter");
        assert!(matches!(err, DispatcherError::SinkCreation { ref name, .. } if name == "jsonl"));

        let err = SubmitError::BufferFull { capacity: 3 };
        assert_eq!(err.to_string(), "buffer full (3 events queued)");
    }
}
