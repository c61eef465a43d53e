//! Sink implementations
//!
//! Contains LogSink, FileSink, and PostgresSink, plus the factory and the
//! reachability probe used by `/health`.

mod file;
mod log;
mod postgres;

pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;
pub use self::postgres::{PostgresSink, PostgresSinkConfig, DEFAULT_DATABASE_URL, DEFAULT_TABLE};

use std::path::PathBuf;

use contracts::{AuditEvent, ContractError, EventSink, SinkConfig, SinkType};
use sqlx::postgres::PgPool;
use tracing::instrument;

use crate::error::DispatcherError;

/// Any configured sink
pub enum AnySink {
    Log(LogSink),
    File(FileSink),
    Postgres(PostgresSink),
}

impl AnySink {
    /// Probe for the same backend, usable while the sink is owned by the dispatcher
    pub fn probe(&self) -> SinkProbe {
        match self {
            AnySink::Log(sink) => SinkProbe::Always {
                name: sink.name().to_string(),
            },
            AnySink::File(sink) => SinkProbe::File {
                name: sink.name().to_string(),
                path: sink.path().to_path_buf(),
            },
            AnySink::Postgres(sink) => SinkProbe::Postgres {
                name: sink.name().to_string(),
                pool: sink.pool().clone(),
            },
        }
    }
}

impl EventSink for AnySink {
    fn name(&self) -> &str {
        match self {
            AnySink::Log(sink) => sink.name(),
            AnySink::File(sink) => sink.name(),
            AnySink::Postgres(sink) => sink.name(),
        }
    }

    async fn write_batch(&mut self, batch: &[AuditEvent]) -> Result<(), ContractError> {
        match self {
            AnySink::Log(sink) => sink.write_batch(batch).await,
            AnySink::File(sink) => sink.write_batch(batch).await,
            AnySink::Postgres(sink) => sink.write_batch(batch).await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            AnySink::Log(sink) => sink.close().await,
            AnySink::File(sink) => sink.close().await,
            AnySink::Postgres(sink) => sink.close().await,
        }
    }
}

/// Create a sink from configuration
#[instrument(
    name = "dispatcher_create_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub async fn create_sink(config: &SinkConfig) -> Result<AnySink, DispatcherError> {
    match config.sink_type {
        SinkType::Log => Ok(AnySink::Log(LogSink::new(&config.name))),
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(AnySink::File(sink))
        }
        SinkType::Postgres => {
            let sink = PostgresSink::from_params(&config.name, &config.params)
                .await
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(AnySink::Postgres(sink))
        }
    }
}

/// Cheap reachability check for the configured backend
#[derive(Clone, Debug)]
pub enum SinkProbe {
    /// Backend with nothing to check
    Always { name: String },
    /// Output file must still be writable
    File { name: String, path: PathBuf },
    /// `SELECT 1` through the sink's pool
    Postgres { name: String, pool: PgPool },
}

impl SinkProbe {
    pub fn name(&self) -> &str {
        match self {
            SinkProbe::Always { name }
            | SinkProbe::File { name, .. }
            | SinkProbe::Postgres { name, .. } => name,
        }
    }

    /// Ok if the backend is reachable
    pub async fn check(&self) -> Result<(), DispatcherError> {
        match self {
            SinkProbe::Always { .. } => Ok(()),
            SinkProbe::File { name, path } => {
                let metadata = tokio::fs::metadata(path)
                    .await
                    .map_err(|e| DispatcherError::probe(name, format!("{}: {e}", path.display())))?;
                if metadata.permissions().readonly() {
                    return Err(DispatcherError::probe(
                        name,
                        format!("{} is read-only", path.display()),
                    ));
                }
                Ok(())
            }
            SinkProbe::Postgres { name, pool } => {
                sqlx::query("SELECT 1")
                    .execute(pool)
                    .await
                    .map_err(|e| DispatcherError::probe(name, e.to_string()))?;
                Ok(())
            }
        }
    }
}
