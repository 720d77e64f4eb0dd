//! Engine configuration.
//!
//! Every field has a default, so an empty YAML document is a valid config.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::registry::is_id_char;

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Choice id assignment and group validation.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Mask token format.
    #[serde(default)]
    pub masking: MaskingConfig,
    /// Event log settings (consumed by front ends; the engine itself does not log).
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Choice Registry settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// Prefix for every `original_id` (`choice_` + name, or `choice_` + ordinal).
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
    /// If true, a group with no correct choice (including an empty group) is rejected.
    #[serde(default)]
    pub require_correct: bool,
}

fn default_id_prefix() -> String {
    "choice_".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            id_prefix: default_id_prefix(),
            require_correct: false,
        }
    }
}

/// Mask Table settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MaskingConfig {
    /// Tokens are `token_prefix` + display index.
    #[serde(default = "default_token_prefix")]
    pub token_prefix: String,
}

fn default_token_prefix() -> String {
    "mask_".to_string()
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            token_prefix: default_token_prefix(),
        }
    }
}

/// NDJSON event log settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Append events here. `None` disables the event log.
    #[serde(default)]
    pub events_path: Option<String>,
    /// Flush after this many lines (0 = flush only on exit).
    #[serde(default)]
    pub flush_every_lines: u64,
}

impl EngineConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path)?;
        Self::from_yaml_bytes(&bytes)
    }

    /// Load configuration from raw file bytes; invalid UTF-8 is rejected.
    pub fn from_yaml_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        Self::from_yaml(std::str::from_utf8(bytes)?)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yaml rejects an empty document; treat it as all-defaults.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.id_prefix.is_empty() {
            return Err(ConfigError::Invalid("registry.id_prefix must not be empty".into()));
        }
        if self.masking.token_prefix.is_empty() {
            return Err(ConfigError::Invalid("masking.token_prefix must not be empty".into()));
        }
        for (key, prefix) in [
            ("registry.id_prefix", &self.registry.id_prefix),
            ("masking.token_prefix", &self.masking.token_prefix),
        ] {
            if !prefix.chars().all(is_id_char) {
                return Err(ConfigError::Invalid(format!(
                    "{key} {prefix:?} may only contain ASCII letters, digits and _-.:"
                )));
            }
        }
        let (ids, tokens) = (&self.registry.id_prefix, &self.masking.token_prefix);
        if ids.starts_with(tokens.as_str()) || tokens.starts_with(ids.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "registry.id_prefix {ids:?} and masking.token_prefix {tokens:?} overlap; ids and tokens would be confusable"
            )));
        }
        Ok(())
    }
}
