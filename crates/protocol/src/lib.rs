//! # wr-protocol
//!
//! Shared data models for wrf-runner.
//!
//! This crate defines the plain data structures passed between the core
//! supervisor and its front ends:
//! - Structured run configuration and system settings
//! - Output monitor state and progress counters
//! - Pipeline reports and step results
//! - Events emitted while a pipeline runs
//!
//! ## Modules
//!
//! - [`config_models`]: Run configuration (WPS and WRF) and system settings
//! - [`process_models`]: Monitor state, progress and process results
//! - [`pipeline_models`]: Pipeline reports
//! - [`ipc`]: Events for front ends
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde and uuid
//! - Independent compilation: No dependencies on other wrf-runner crates

pub mod config_models;
pub mod ipc;
pub mod pipeline_models;
pub mod process_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use ipc::*;
pub use pipeline_models::*;
pub use process_models::*;
