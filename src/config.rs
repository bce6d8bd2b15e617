//! TOML configuration for runs and imports.
//!
//! ```toml
//! [execution]
//! budget_factor = 4
//!
//! [import]
//! format = "raw"
//! width = 256
//! height = 256
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Every section and key is optional.

use crate::core::error::ConfigError;
use crate::execution::engine::{ExecutionOptions, DEFAULT_BUDGET_FACTOR};
use crate::io::{ImportFormat, ImportOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Scheduler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Queue iterations allowed per node.
    pub budget_factor: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            budget_factor: DEFAULT_BUDGET_FACTOR,
        }
    }
}

/// Defaults for loading source files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Format to decode sources as.
    pub format: ImportFormat,
    /// Declared shape; both or neither.
    pub width: Option<usize>,
    pub height: Option<usize>,
}

/// Log filter used when `RUST_LOG` is unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `env_logger` filter, e.g. `info` or `pixelflow=debug`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub execution: ExecutionConfig,
    pub import: ImportConfig,
    pub logging: LoggingConfig,
}

impl FlowConfig {
    /// Read and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: FlowConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.execution.budget_factor == 0 {
            return Err(ConfigError::Invalid(
                "execution.budget_factor must be at least 1".to_string(),
            ));
        }
        match (self.import.width, self.import.height) {
            (Some(0), _) | (_, Some(0)) => Err(ConfigError::Invalid(
                "import.width and import.height must be non-zero".to_string(),
            )),
            (Some(_), None) | (None, Some(_)) => Err(ConfigError::Invalid(
                "import.width and import.height must be given together".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Scheduler options (no progress callback).
    pub fn to_execution_options(&self) -> ExecutionOptions {
        ExecutionOptions::new().with_budget_factor(self.execution.budget_factor)
    }

    /// Import options for source files.
    pub fn to_import_options(&self) -> ImportOptions {
        let options = ImportOptions::new().with_format(self.import.format);
        match (self.import.width, self.import.height) {
            (Some(width), Some(height)) => options.with_dimensions(width, height),
            _ => options,
        }
    }
}
