//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! across domo applications: the [`ConfigLoader`] trait with a blanket
//! implementation, the [`SharedConfig`] base section, and the engine
//! configuration consumed by the program manager.
//!
//! # Usage
//!
//! ```rust,no_run
//! use domo_common::config::{ConfigLoader, EngineConfig};
//! use std::path::Path;
//!
//! let config = EngineConfig::load(Path::new("config/domo.toml")).expect("load config");
//! println!("Service: {}", config.shared.service_name);
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::consts::{
    DEFAULT_PROGRAMS_PATH, DISPATCH_WORKERS_DEFAULT, DISPATCH_WORKERS_MAX, DISPATCH_WORKERS_MIN,
};

/// Log level for configuration.
///
/// Serializes to lowercase strings: "trace", "debug", "info", "warn", "error".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace-level verbosity.
    Trace,
    /// Debug-level verbosity.
    Debug,
    /// Info-level verbosity (default).
    Info,
    /// Warning-level verbosity.
    Warn,
    /// Error-level verbosity.
    Error,
}

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Common configuration fields shared across all domo applications.
///
/// This struct should be embedded in application-specific configuration
/// structs to provide consistent base configuration.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "domo"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    pub service_name: String,
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `service_name` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Engine Configuration ───────────────────────────────────────────

fn default_programs_dir() -> PathBuf {
    PathBuf::from(DEFAULT_PROGRAMS_PATH)
}

fn default_dispatch_workers() -> usize {
    DISPATCH_WORKERS_DEFAULT
}

/// Program manager settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    /// Root directory for per-program compiled artifacts.
    #[serde(default = "default_programs_dir")]
    pub programs_dir: PathBuf,

    /// Number of workers in the post-change dispatch pool (1..=64).
    #[serde(default = "default_dispatch_workers")]
    pub dispatch_workers: usize,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            programs_dir: default_programs_dir(),
            dispatch_workers: default_dispatch_workers(),
        }
    }
}

impl EngineSection {
    /// Validate the engine section against the workspace bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.programs_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "programs_dir cannot be empty".to_string(),
            ));
        }
        if self.dispatch_workers < DISPATCH_WORKERS_MIN
            || self.dispatch_workers > DISPATCH_WORKERS_MAX
        {
            return Err(ConfigError::ValidationError(format!(
                "dispatch_workers must be in {DISPATCH_WORKERS_MIN}..={DISPATCH_WORKERS_MAX}, got {}",
                self.dispatch_workers
            )));
        }
        Ok(())
    }
}

/// Top-level configuration for the domo daemon.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "info"
/// service_name = "domo"
///
/// [engine]
/// programs_dir = "programs"
/// dispatch_workers = 4
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub shared: SharedConfig,

    #[serde(default)]
    pub engine: EngineSection,
}

impl EngineConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// This trait provides a default implementation that works with any type
/// implementing `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn engine_config_parses_with_defaults() {
        let toml_str = r#"
            [shared]
            service_name = "domo"
        "#;
        let config: EngineConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.shared.log_level, LogLevel::Info);
        assert_eq!(config.engine.dispatch_workers, DISPATCH_WORKERS_DEFAULT);
        assert_eq!(
            config.engine.programs_dir,
            PathBuf::from(DEFAULT_PROGRAMS_PATH)
        );
        config.validate().expect("valid");
    }

    #[test]
    fn empty_service_name_rejected() {
        let toml_str = r#"
            [shared]
            service_name = ""
        "#;
        let config: EngineConfig = toml::from_str(toml_str).expect("parse");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn dispatch_workers_out_of_range_rejected() {
        let toml_str = r#"
            [shared]
            service_name = "domo"

            [engine]
            dispatch_workers = 0
        "#;
        let config: EngineConfig = toml::from_str(toml_str).expect("parse");
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_engine_field_rejected() {
        let toml_str = r#"
            [shared]
            service_name = "domo"

            [engine]
            no_such_field = 1
        "#;
        assert!(toml::from_str::<EngineConfig>(toml_str).is_err());
    }

    #[test]
    fn load_missing_file_is_file_not_found() {
        let result = EngineConfig::load(Path::new("/nonexistent/domo.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn load_from_file_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("domo.toml");
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(file, "[shared]\nservice_name = \"domo\"\nlog_level = \"debug\"").expect("write");

        let config = EngineConfig::load(&path).expect("load");
        assert_eq!(config.shared.log_level, LogLevel::Debug);
        assert_eq!(config.shared.service_name, "domo");
    }
}
