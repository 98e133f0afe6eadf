//! Error types for configuration loading and validation.
//!
//! Every error here is detected before any program is spawned.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration file from disk.
    #[error("Failed to read config file at {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse JSON configuration.
    #[error("Failed to parse JSON file at {path}: {source}")]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse YAML file at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("Failed to parse TOML file at {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// The file extension does not name a supported format.
    #[error("Unsupported configuration format for {path} (expected .json, .yaml or .yml)")]
    UnsupportedFormat { path: PathBuf },

    /// The configuration parsed but breaks a WPS rule.
    #[error("Invalid configuration: {reason}")]
    Invalid { reason: String },

    /// Neither the system config nor `WPS_PATH` names the WPS directory.
    #[error("WPS directory is not configured (set wps_path or WPS_PATH)")]
    MissingWpsPath,

    /// Neither the system config nor `WRF_PATH` names the WRF run directory.
    #[error("WRF directory is not configured (set wrf_path or WRF_PATH)")]
    MissingWrfPath,
}

impl ConfigError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            reason: reason.into(),
        }
    }
}

/// Type alias for Result with ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;
