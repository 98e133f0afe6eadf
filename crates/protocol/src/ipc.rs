//! Events emitted by the core while a pipeline runs.
//!
//! Front ends (the CLI progress display, tests) subscribe to these through
//! a tokio channel. Events are informational only; dropping the receiver
//! never affects the pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status updates sent from the core to a front end.
///
/// Uses tagged enum serialization:
/// ```json
/// {
///   "type": "stepStarted",
///   "payload": {
///     "session_id": "uuid-here",
///     "step_index": 0,
///     "description": "geogrid"
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A pipeline session has started.
    PipelineStarted { session_id: Uuid, step_count: usize },

    /// A step has become the current step.
    StepStarted {
        session_id: Uuid,
        step_index: usize,
        description: String,
    },

    /// A step has returned.
    StepFinished {
        session_id: Uuid,
        step_index: usize,
        success: bool,
    },

    /// The pipeline session has finished, successfully or not.
    PipelineFinished { session_id: Uuid, success: bool },
}
