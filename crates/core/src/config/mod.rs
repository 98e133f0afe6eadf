//! Configuration loading and validation.
//!
//! WPS run configuration comes from JSON or YAML and is validated before any
//! program runs. System configuration comes from TOML.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use models::ValidatedWpsConfig;
