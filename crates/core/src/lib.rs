//! # wr-core
//!
//! Process supervision and sequencing for the WRF Preprocessing System.
//!
//! This crate provides:
//! - Configuration loading and validation for WPS runs
//! - `namelist.wps` rendering
//! - Output monitoring that turns program text into progress and a verdict
//! - Supervised launching of external programs
//! - A sequential step pipeline and the WPS program steps
//! - GRIB input staging and NAM dataset discovery
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`namelist`]: Fortran namelist rendering
//! - [`monitor`]: Line classifiers and the output state machine
//! - [`notifier`]: Progress notification
//! - [`supervisor`]: External program supervision
//! - [`pipeline`]: Sequential step execution
//! - [`steps`]: Program steps and the WPS factories
//! - [`staging`]: GRIB links and datasets

pub mod config;
pub mod monitor;
pub mod namelist;
pub mod notifier;
pub mod pipeline;
pub mod staging;
pub mod steps;
pub mod supervisor;
