//! Output monitor and process result models.
//!
//! This module defines the state reported by the output monitor while a
//! program runs, and the result recorded once the program has exited.

use serde::{Deserialize, Serialize};

/// Lifecycle state of the output monitor for one program run.
///
/// The state progresses through these states during a normal run:
/// Initializing -> Processing -> Done
///
/// `Error` is reachable from any state. `Done` and `Error` are terminal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorState {
    /// The program has started but has not reported any unit of work yet.
    #[default]
    Initializing,

    /// The program is working through its units (domains, dates).
    Processing,

    /// The program printed its completion line.
    Done,

    /// The program printed an error line.
    Error,
}

impl MonitorState {
    /// Returns true for `Done` and `Error`.
    pub fn is_terminal(self) -> bool {
        matches!(self, MonitorState::Done | MonitorState::Error)
    }
}

/// Progress counters: the most recently reported unit and the expected count.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    /// Index of the unit currently being processed (1-based as printed).
    pub current: u32,

    /// Expected number of units.
    pub total: u32,
}

impl Progress {
    pub fn new(current: u32, total: u32) -> Self {
        Self { current, total }
    }
}

/// Outcome of one supervised program launch.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessResult {
    /// Exit code of the child, `None` if it was terminated by a signal.
    pub exit_code: Option<i32>,

    /// Monitor state once both output streams were drained.
    pub terminal_state: MonitorState,
}

impl ProcessResult {
    /// A run succeeds only if the program exited with 0 *and* the monitor
    /// saw its completion line.
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0) && self.terminal_state == MonitorState::Done
    }
}
