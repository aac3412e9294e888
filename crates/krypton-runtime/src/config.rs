//! Runtime configuration.
//!
//! Sources, lowest to highest precedence:
//! 1. Default values
//! 2. A YAML configuration file
//! 3. Environment variables with the `KRYPTON_` prefix
//!
//! Command-line flags are applied on top by the CLI.

use std::path::{Path, PathBuf};

use krypton_vm::Limits;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Directory imports are resolved against. Defaults to the directory of
    /// the entry file, or the working directory for in-memory sources.
    #[serde(default)]
    pub import_root: Option<PathBuf>,

    /// Interpreter limits.
    #[serde(default)]
    pub limits: Limits,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: RuntimeConfig = serde_yaml_ng::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an optional file, then apply environment
    /// overrides and validate.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        let config = config.merge_env();
        config.validate()?;
        Ok(config)
    }

    /// Merge `KRYPTON_*` environment variables into this configuration.
    pub fn merge_env(self) -> Self {
        self.merge_vars(|name| std::env::var(name).ok())
    }

    /// Merge overrides from any variable source.
    ///
    /// Only variables that are present override the current values.
    /// Unparseable numbers are ignored with a warning.
    pub fn merge_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = var("KRYPTON_IMPORT_ROOT") {
            self.import_root = Some(PathBuf::from(v));
        }
        if let Some(v) = var("KRYPTON_MAX_FRAMES") {
            match v.parse() {
                Ok(val) => self.limits.max_frames = val,
                Err(_) => warn!("Ignoring KRYPTON_MAX_FRAMES={v}: not a number"),
            }
        }
        if let Some(v) = var("KRYPTON_MAX_STACK_DEPTH") {
            match v.parse() {
                Ok(val) => self.limits.max_stack_depth = val,
                Err(_) => warn!("Ignoring KRYPTON_MAX_STACK_DEPTH={v}: not a number"),
            }
        }
        if let Some(v) = var("KRYPTON_LOG_LEVEL") {
            self.logging.level = v;
        }
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_frames == 0 {
            return Err(ConfigError::Validation(
                "max_frames must be greater than 0".to_string(),
            ));
        }
        if self.limits.max_stack_depth == 0 {
            return Err(ConfigError::Validation(
                "max_stack_depth must be greater than 0".to_string(),
            ));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::Validation(format!(
                    "Invalid log level: {other}"
                )));
            }
        }

        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
