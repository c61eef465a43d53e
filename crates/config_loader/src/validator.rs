//! Config validation
//!
//! Rules:
//! - queue_capacity >= 1, 1 <= batch_size <= 5000, flush_interval_ms >= 1
//! - sink name non-empty
//! - file sink has a `path`
//! - postgres `url`, when given, uses a postgres scheme

use contracts::{ContractError, IngestConfig, SinkType};
use ::validator::Validate;

/// Validate an IngestConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &IngestConfig) -> Result<(), ContractError> {
    validate_dispatcher(config)?;
    validate_sink(config)?;
    Ok(())
}

/// Non-fatal issues worth surfacing to an operator
pub fn warnings(config: &IngestConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let d = &config.dispatcher;

    if d.batch_size > d.queue_capacity {
        warnings.push(format!(
            "dispatcher.batch_size ({}) exceeds queue_capacity ({}) - batches will mostly be flushed by the timer",
            d.batch_size, d.queue_capacity
        ));
    }
    if config.sink.sink_type == SinkType::Log {
        warnings.push("sink_type is 'log' - events will not be persisted".to_string());
    }
    if d.drain_timeout_ms == 0 {
        warnings.push(
            "dispatcher.drain_timeout_ms is 0 - queued events are discarded on shutdown"
                .to_string(),
        );
    }

    warnings
}

/// Range checks on queue and flush policy
fn validate_dispatcher(config: &IngestConfig) -> Result<(), ContractError> {
    config.dispatcher.validate().map_err(|errors| {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|k| format!("dispatcher.{k}"))
            .unwrap_or_else(|| "dispatcher".to_string());
        ContractError::config_validation(field, errors.to_string())
    })
}

/// Sink-specific parameters
fn validate_sink(config: &IngestConfig) -> Result<(), ContractError> {
    let sink = &config.sink;

    if sink.name.trim().is_empty() {
        return Err(ContractError::config_validation(
            "sink.name",
            "sink name cannot be empty",
        ));
    }

    match sink.sink_type {
        SinkType::File => {
            let has_path = sink
                .params
                .get("path")
                .is_some_and(|p| !p.trim().is_empty());
            if !has_path {
                return Err(ContractError::config_validation(
                    "sink.params.path",
                    "file sink requires a 'path' parameter",
                ));
            }
        }
        SinkType::Postgres => {
            if let Some(url) = sink.params.get("url") {
                if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                    return Err(ContractError::config_validation(
                        "sink.params.url",
                        "url must start with postgres:// or postgresql://",
                    ));
                }
            }
        }
        SinkType::Log => {}
    }

    Ok(())
}
