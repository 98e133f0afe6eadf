//! Common test utilities for the integration tests.
//!
//! This module provides shared functionality across the integration tests:
//! - Fixtures (sample configurations, fake WPS installs)
//! - Assertions over pipeline events
//! - A recording progress notifier

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
