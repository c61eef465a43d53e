//! Layered error definitions
//!
//! Categorized by source: event validation / config / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Event Validation Errors =====
    /// Request body is not a valid event document
    #[error("Invalid JSON")]
    MalformedPayload {
        #[source]
        source: serde_json::Error,
    },

    /// Required event field absent or empty
    #[error("{field} is required")]
    MissingField { field: String },

    /// Event field present but unusable
    #[error("invalid {field}: {message}")]
    InvalidField { field: String, message: String },

    /// Event field that does not parse as its type
    #[error("invalid {field}")]
    UnparseableField { field: String },

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create invalid field error
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create unparseable field error
    pub fn unparseable_field(field: impl Into<String>) -> Self {
        Self::UnparseableField {
            field: field.into(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create sink connection error
    pub fn sink_connection(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkConnection {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Field name for validation errors, used as a metrics label
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field }
            | Self::InvalidField { field, .. }
            | Self::UnparseableField { field } => Some(field.as_str()),
            Self::MalformedPayload { .. } => Some("body"),
            _ => None,
        }
    }

    /// True for errors caused by the client's event document
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MalformedPayload { .. }
                | Self::MissingField { .. }
                | Self::InvalidField { .. }
                | Self::UnparseableField { .. }
        )
    }
}
