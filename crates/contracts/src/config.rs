//! IngestConfig - Config Loader output
//!
//! Describes the complete service configuration: HTTP server, dispatcher
//! flush policy, and persistence target.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use validator::Validate;

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Queue and flush policy
    #[serde(default)]
    pub dispatcher: DispatcherSettings,

    /// Persistence target
    #[serde(default)]
    pub sink: SinkConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Listening port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound for the sink probe behind `/health`
    #[serde(default = "default_health_timeout_ms")]
    pub health_timeout_ms: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_health_timeout_ms() -> u64 {
    5000
}

impl ServerConfig {
    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            health_timeout_ms: default_health_timeout_ms(),
        }
    }
}

/// Buffered dispatcher settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DispatcherSettings {
    /// Bounded queue capacity (events)
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1))]
    pub queue_capacity: usize,

    /// Size-triggered flush threshold (events)
    ///
    /// Capped so one multi-row INSERT stays under the Postgres bind limit.
    #[serde(default = "default_batch_size")]
    #[validate(range(min = 1, max = 5000))]
    pub batch_size: usize,

    /// Time-triggered flush interval
    #[serde(default = "default_flush_interval_ms")]
    #[validate(range(min = 1))]
    pub flush_interval_ms: u64,

    /// Upper bound for the final drain on shutdown
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_batch_size() -> usize {
    100
}

fn default_flush_interval_ms() -> u64 {
    5000
}

fn default_drain_timeout_ms() -> u64 {
    5000
}

impl DispatcherSettings {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            batch_size: default_batch_size(),
            flush_interval_ms: default_flush_interval_ms(),
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

/// Sink configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    #[serde(default = "default_sink_name")]
    pub name: String,

    /// Sink type
    #[serde(default)]
    pub sink_type: SinkType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_sink_name() -> String {
    "events".to_string()
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            name: default_sink_name(),
            sink_type: SinkType::default(),
            params: HashMap::new(),
        }
    }
}

/// Sink type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// PostgreSQL table
    #[default]
    Postgres,
    /// JSON Lines file
    File,
    /// Tracing output only
    Log,
}

impl SinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkType::Postgres => "postgres",
            SinkType::File => "file",
            SinkType::Log => "log",
        }
    }
}

impl std::str::FromStr for SinkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(SinkType::Postgres),
            "file" => Ok(SinkType::File),
            "log" => Ok(SinkType::Log),
            other => Err(format!("unknown sink type '{other}'")),
        }
    }
}
