//! Output monitoring for supervised programs.
//!
//! The programs report progress only as free-form text. This module turns a
//! sequence of lines into a small state machine:
//!
//! ```text
//! Initializing --progress--> Processing --completion--> Done
//!       \                        |
//!        `------- error ---------+-------------------> Error
//! ```
//!
//! Nothing in here performs IO; lines are pushed in by the supervisor.

pub mod classifiers;
pub mod machine;

pub use classifiers::{ClassifierSet, Classification};
pub use machine::{transition, OutputStateMachine, Snapshot, Transition};
