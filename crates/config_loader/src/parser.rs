//! Config file parsing
//!
//! TOML (primary) and JSON (optional).

use contracts::{ContractError, IngestConfig};

/// Config file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML config
pub fn parse_toml(content: &str) -> Result<IngestConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON config
pub fn parse_json(content: &str) -> Result<IngestConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse according to format
pub fn parse(content: &str, format: ConfigFormat) -> Result<IngestConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SinkType;

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
[server]
host = "127.0.0.1"
port = 9090

[dispatcher]
queue_capacity = 500
batch_size = 50
flush_interval_ms = 1000

[sink]
name = "audit_log"
sink_type = "postgres"
[sink.params]
url = "postgres://audit@db/audit"
table = "events"
"#;
        let config = parse_toml(content).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.dispatcher.queue_capacity, 500);
        assert_eq!(config.dispatcher.flush_interval_ms, 1000);
        assert_eq!(config.sink.sink_type, SinkType::Postgres);
        assert_eq!(config.sink.params["table"], "events");
    }

    #[test]
    fn test_parse_empty_toml_is_all_defaults() {
        let config = parse_toml("").unwrap();
        assert_eq!(config, IngestConfig::default());
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "dispatcher": { "batch_size": 25 },
            "sink": { "sink_type": "log" }
        }"#;
        let config = parse_json(content).unwrap();
        assert_eq!(config.dispatcher.batch_size, 25);
        assert_eq!(config.sink.sink_type, SinkType::Log);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
