//! Configuration types and loading.
//!
//! ```yaml
//! runner:
//!   log-file-name: log.txt
//! batch:
//!   suppress: [resource, temporary-resource]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ErrorKind;

pub const LOCAL_CONFIG: &str = ".freefall.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreefallConfig {
    pub runner: RunnerConfig,
    pub batch: BatchConfig,
}

/// Per-request runner settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// File name of the request log inside the archive prefix.
    #[serde(rename = "log-file-name")]
    pub log_file_name: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            log_file_name: "log.txt".to_string(),
        }
    }
}

/// Batch driver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Failed kinds that are logged and then swallowed instead of propagated.
    pub suppress: Vec<ErrorKind>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            suppress: vec![ErrorKind::Resource, ErrorKind::TemporaryResource],
        }
    }
}

impl BatchConfig {
    /// Propagate every failure.
    pub fn strict() -> Self {
        Self {
            suppress: Vec::new(),
        }
    }

    /// Unexpected errors are never suppressed, whatever the list says.
    pub fn suppresses(&self, kind: ErrorKind) -> bool {
        kind != ErrorKind::Unexpected && self.suppress.contains(&kind)
    }
}

impl FreefallConfig {
    /// Fail fast on settings that would silently misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = &self.runner.log_file_name;
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ConfigError::Invalid(format!(
                "log-file-name must be a plain file name, got '{name}'"
            )));
        }
        if self.batch.suppress.contains(&ErrorKind::Unexpected) {
            return Err(ConfigError::Invalid(
                "unexpected errors cannot be suppressed".to_string(),
            ));
        }
        Ok(())
    }

    /// Load with fallback: explicit path, then `./.freefall.yml`, then defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => return Ok(config),
                Err(e) => tracing::warn!("Failed to load config from {}: {}", local.display(), e),
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }
}
