//! Pipeline report models.
//!
//! A pipeline session runs an ordered list of steps and stops at the first
//! failure. The report captures what ran and where it stopped.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of one pipeline session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Unique identifier for this pipeline session.
    pub session_id: Uuid,

    /// Step descriptions in registration order.
    pub steps: Vec<String>,

    /// Zero-based index of the step currently executing.
    ///
    /// After a failure this points at the failing step. It is cleared once
    /// every step has succeeded.
    pub current_step: Option<usize>,

    /// Overall result, `None` until `run_all` has returned.
    pub result: Option<bool>,
}

impl PipelineReport {
    /// Description of the step the pointer refers to.
    pub fn current_description(&self) -> Option<&str> {
        self.current_step
            .and_then(|index| self.steps.get(index))
            .map(String::as_str)
    }
}
