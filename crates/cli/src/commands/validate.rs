//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use config_loader::{ConfigLoader, IngestConfig};

use crate::cli::ValidateArgs;
use crate::commands::run::load_config;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    /// File path, or "environment"
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    listen: String,
    queue_capacity: usize,
    batch_size: usize,
    flush_interval_ms: u64,
    drain_timeout_ms: u64,
    sink_name: String,
    sink_type: String,
}

impl From<&IngestConfig> for ConfigSummary {
    fn from(config: &IngestConfig) -> Self {
        Self {
            listen: format!("{}:{}", config.server.host, config.server.port),
            queue_capacity: config.dispatcher.queue_capacity,
            batch_size: config.dispatcher.batch_size,
            flush_interval_ms: config.dispatcher.flush_interval_ms,
            drain_timeout_ms: config.dispatcher.drain_timeout_ms,
            sink_name: config.sink.name.clone(),
            sink_type: config.sink.sink_type.as_str().to_string(),
        }
    }
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let source = args
        .config
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "environment".to_string());
    info!(%source, "Validating configuration");

    match load_config(args.config.as_deref()) {
        Ok(config) => {
            let warnings = ConfigLoader::warnings(&config);
            ValidationResult {
                valid: true,
                source,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary::from(&config)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            source,
            error: Some(format!("{e:#}")),
            warnings: None,
            summary: None,
        },
    }
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.source);

        if let Some(ref summary) = result.summary {
            println!("\n  Listen: {}", summary.listen);
            println!("  Queue capacity: {}", summary.queue_capacity);
            println!("  Batch size: {}", summary.batch_size);
            println!("  Flush interval: {}ms", summary.flush_interval_ms);
            println!("  Drain timeout: {}ms", summary.drain_timeout_ms);
            println!("  Sink: {} ({})", summary.sink_name, summary.sink_type);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.source);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
