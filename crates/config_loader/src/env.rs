//! Environment overrides
//!
//! | variable         | target                                   |
//! |------------------|------------------------------------------|
//! | `HOST`           | `server.host`                            |
//! | `PORT`           | `server.port`                            |
//! | `BUFFER_SIZE`    | `dispatcher.queue_capacity`              |
//! | `BATCH_SIZE`     | `dispatcher.batch_size`                  |
//! | `FLUSH_INTERVAL` | `dispatcher.flush_interval_ms` (duration)|
//! | `DRAIN_TIMEOUT`  | `dispatcher.drain_timeout_ms` (duration) |
//! | `SINK_TYPE`      | `sink.sink_type`                         |
//! | `DATABASE_URL`   | `sink.params.url`                        |
//! | `SINK_TABLE`     | `sink.params.table`                      |
//! | `SINK_PATH`      | `sink.params.path`                       |
//!
//! Empty values are ignored. Unparseable values are errors.

use std::str::FromStr;
use std::time::Duration;

use contracts::{ContractError, IngestConfig, SinkType};

/// Apply overrides using `lookup` to read variables
pub fn apply<F>(config: &mut IngestConfig, lookup: F) -> Result<(), ContractError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(host) = get("HOST") {
        config.server.host = host;
    }
    if let Some(port) = get("PORT") {
        config.server.port = parse_number("PORT", &port)?;
    }
    if let Some(size) = get("BUFFER_SIZE") {
        config.dispatcher.queue_capacity = parse_number("BUFFER_SIZE", &size)?;
    }
    if let Some(size) = get("BATCH_SIZE") {
        config.dispatcher.batch_size = parse_number("BATCH_SIZE", &size)?;
    }
    if let Some(interval) = get("FLUSH_INTERVAL") {
        config.dispatcher.flush_interval_ms = parse_duration_ms("FLUSH_INTERVAL", &interval)?;
    }
    if let Some(timeout) = get("DRAIN_TIMEOUT") {
        config.dispatcher.drain_timeout_ms = parse_duration_ms("DRAIN_TIMEOUT", &timeout)?;
    }
    if let Some(sink_type) = get("SINK_TYPE") {
        config.sink.sink_type = SinkType::from_str(&sink_type)
            .map_err(|e| ContractError::config_parse(format!("SINK_TYPE: {e}")))?;
    }
    for (key, param) in [
        ("DATABASE_URL", "url"),
        ("SINK_TABLE", "table"),
        ("SINK_PATH", "path"),
    ] {
        if let Some(value) = get(key) {
            config.sink.params.insert(param.to_string(), value);
        }
    }

    Ok(())
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, ContractError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ContractError::config_parse(format!("{key}={value:?}: {e}")))
}

fn parse_duration_ms(key: &str, value: &str) -> Result<u64, ContractError> {
    let duration = parse_duration(value)
        .map_err(|e| ContractError::config_parse(format!("{key}={value:?}: {e}")))?;
    u64::try_from(duration.as_millis())
        .map_err(|_| ContractError::config_parse(format!("{key}={value:?}: duration too large")))
}

/// Parse a Go-style duration (`300ms`, `5s`, `1m30s`, `1.5h`)
///
/// A bare number is taken as seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total_nanos = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration '{input}'"))?;
        if num_end == 0 {
            return Err(format!("invalid duration '{input}'"));
        }
        let value: f64 = rest[..num_end]
            .parse()
            .map_err(|_| format!("invalid number in duration '{input}'"))?;
        rest = &rest[num_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_end] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            unit => return Err(format!("unknown unit '{unit}' in duration '{input}'")),
        };
        total_nanos += value * nanos_per_unit;
        rest = &rest[unit_end..];
    }

    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("300ms").unwrap(), Duration::from_millis(300));
        assert_eq!(parse_duration("10").unwrap(), Duration::from_secs(10));
        assert!(parse_duration("5 parsecs").is_err());
        assert!(parse_duration("ms").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn test_apply_service_variables() {
        let mut config = IngestConfig::default();
        apply(
            &mut config,
            lookup(&[
                ("DATABASE_URL", "postgres://u:p@db:5432/audit"),
                ("PORT", "9000"),
                ("BUFFER_SIZE", "64"),
                ("FLUSH_INTERVAL", "250ms"),
                ("BATCH_SIZE", "8"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.dispatcher.queue_capacity, 64);
        assert_eq!(config.dispatcher.flush_interval_ms, 250);
        assert_eq!(config.dispatcher.batch_size, 8);
        assert_eq!(config.sink.params["url"], "postgres://u:p@db:5432/audit");
    }

    #[test]
    fn test_apply_sink_overrides() {
        let mut config = IngestConfig::default();
        apply(
            &mut config,
            lookup(&[("SINK_TYPE", "file"), ("SINK_PATH", "/var/lib/audit/events.jsonl")]),
        )
        .unwrap();
        assert_eq!(config.sink.sink_type, SinkType::File);
        assert_eq!(config.sink.params["path"], "/var/lib/audit/events.jsonl");
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let mut config = IngestConfig::default();
        apply(&mut config, lookup(&[("PORT", ""), ("BATCH_SIZE", "  ")])).unwrap();
        assert_eq!(config, IngestConfig::default());
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let mut config = IngestConfig::default();
        let err = apply(&mut config, lookup(&[("BATCH_SIZE", "lots")])).unwrap_err();
        assert!(err.to_string().contains("BATCH_SIZE"), "got: {err}");

        let err = apply(&mut config, lookup(&[("FLUSH_INTERVAL", "soon")])).unwrap_err();
        assert!(err.to_string().contains("FLUSH_INTERVAL"), "got: {err}");

        let err = apply(&mut config, lookup(&[("SINK_TYPE", "kafka")])).unwrap_err();
        assert!(err.to_string().contains("unknown sink type"), "got: {err}");
    }
}
