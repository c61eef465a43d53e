//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Audit Ingest - buffered HTTP ingestion of security audit events
#[derive(Parser, Debug)]
#[command(
    name = "audit-ingest",
    author,
    version,
    about = "Buffered audit event ingestion service",
    long_about = "Accepts audit events over HTTP, queues them in a bounded buffer and \n\
                  writes them to the configured sink in batches, flushing on batch size, \n\
                  on a timer, and on shutdown."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "AUDIT_INGEST_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "json",
        global = true,
        env = "AUDIT_INGEST_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the ingestion service
    Run(RunArgs),

    /// Validate the effective configuration without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
///
/// Flags override the config file and the environment (`PORT`, `BATCH_SIZE`, ...).
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); environment only when omitted
    #[arg(short, long, env = "AUDIT_INGEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Listening port
    #[arg(long)]
    pub port: Option<u16>,

    /// Sink backend
    #[arg(long, value_enum)]
    pub sink: Option<SinkKind>,

    /// Output file for the file sink
    #[arg(long)]
    pub sink_path: Option<PathBuf>,

    /// Postgres connection URL
    #[arg(long)]
    pub database_url: Option<String>,

    /// Bounded queue capacity (events)
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Flush when this many events are batched
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Flush interval, e.g. `5s` or `250ms`
    #[arg(long, value_parser = parse_duration_arg)]
    pub flush_interval: Option<Duration>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "AUDIT_INGEST_METRICS_PORT")]
    pub metrics_port: u16,

    /// Resolve and print the configuration, then exit
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate; environment only when omitted
    #[arg(short, long, env = "AUDIT_INGEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    #[default]
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

/// Sink backend selectable from the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkKind {
    Postgres,
    File,
    Log,
}

impl From<SinkKind> for contracts::SinkType {
    fn from(kind: SinkKind) -> Self {
        match kind {
            SinkKind::Postgres => contracts::SinkType::Postgres,
            SinkKind::File => contracts::SinkType::File,
            SinkKind::Log => contracts::SinkType::Log,
        }
    }
}

fn parse_duration_arg(value: &str) -> Result<Duration, String> {
    config_loader::parse_duration(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_overrides() {
        let cli = Cli::parse_from([
            "audit-ingest",
            "-v",
            "run",
            "--port",
            "9090",
            "--sink",
            "file",
            "--sink-path",
            "/tmp/events.jsonl",
            "--flush-interval",
            "250ms",
        ]);

        assert_eq!(cli.verbose, 1);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.port, Some(9090));
        assert_eq!(args.sink, Some(SinkKind::File));
        assert_eq!(args.flush_interval, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_invalid_flush_interval_rejected() {
        let result = Cli::try_parse_from(["audit-ingest", "run", "--flush-interval", "soon"]);
        assert!(result.is_err());
    }
}
