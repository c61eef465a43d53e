//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Overlay environment variables
//! - Validate configuration legality
//! - Generate `IngestConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//!
//! let config = ConfigLoader::from_env().unwrap();
//! println!("Listening on port {}", config.server.port);
//! ```

mod env;
mod parser;
mod validator;

pub use contracts::IngestConfig;
pub use env::parse_duration;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files, strings, or the environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path, then overlay the process environment
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Invalid environment value
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<IngestConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        let mut config = parser::parse(&content, format)?;
        Self::apply_env(&mut config, |key| std::env::var(key).ok())?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Defaults overlaid with the process environment
    pub fn from_env() -> Result<IngestConfig, ContractError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with variables read through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<IngestConfig, ContractError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = IngestConfig::default();
        Self::apply_env(&mut config, lookup)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from string (no environment overlay)
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<IngestConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Overlay `PORT`, `BATCH_SIZE`, `SINK_TYPE`, ... read through `lookup`
    ///
    /// Unset variables leave the field untouched; unparseable values are errors.
    pub fn apply_env<F>(config: &mut IngestConfig, lookup: F) -> Result<(), ContractError>
    where
        F: Fn(&str) -> Option<String>,
    {
        env::apply(config, lookup)
    }

    /// Re-run validation, e.g. after CLI overrides
    pub fn validate(config: &IngestConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Non-fatal configuration issues
    pub fn warnings(config: &IngestConfig) -> Vec<String> {
        validator::warnings(config)
    }

    /// Serialize IngestConfig to TOML string
    pub fn to_toml(config: &IngestConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize IngestConfig to JSON string
    pub fn to_json(config: &IngestConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }
}
