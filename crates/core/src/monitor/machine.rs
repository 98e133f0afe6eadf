//! The output state machine.
//!
//! [`transition`] is the whole automaton as a pure function; the
//! [`OutputStateMachine`] only stores the current snapshot, runs the
//! classifiers and forwards emitted progress to a [`Notifier`].

use crate::monitor::classifiers::{ClassifierSet, Classification};
use crate::notifier::{NoopNotifier, Notifier};
use std::sync::Arc;
use wr_protocol::{MonitorState, Progress};

/// State plus counters at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub state: MonitorState,
    pub progress: Progress,
}

impl Snapshot {
    /// Fresh `Initializing` snapshot with `current_unit` zeroed.
    pub fn initial(seed_total: u32) -> Self {
        Self {
            state: MonitorState::Initializing,
            progress: Progress::new(0, seed_total),
        }
    }
}

/// Next snapshot and the progress pair to report, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: Snapshot,
    pub emit: Option<Progress>,
}

impl Transition {
    fn silent(next: Snapshot) -> Self {
        Self { next, emit: None }
    }

    fn report(state: MonitorState, progress: Progress) -> Self {
        Self {
            next: Snapshot { state, progress },
            emit: Some(progress),
        }
    }
}

/// Apply one classified line to a snapshot.
///
/// An error line wins over everything and is accepted from every state.
/// `Initializing` only reacts to progress, `Processing` checks completion
/// before progress, and `Done`/`Error` ignore everything else.
pub fn transition(current: Snapshot, line: &Classification) -> Transition {
    if line.is_error {
        return Transition::silent(Snapshot {
            state: MonitorState::Error,
            ..current
        });
    }

    match current.state {
        MonitorState::Initializing => match line.progress {
            Some(progress) => Transition::report(MonitorState::Processing, progress),
            None => Transition::silent(current),
        },
        MonitorState::Processing => {
            if line.is_completion {
                let total = current.progress.total;
                Transition::report(MonitorState::Done, Progress::new(total, total))
            } else if let Some(progress) = line.progress {
                Transition::report(MonitorState::Processing, progress)
            } else {
                Transition::silent(current)
            }
        }
        MonitorState::Done | MonitorState::Error => Transition::silent(current),
    }
}

/// Stateful monitor for one program's output.
///
/// Created once per step and reset before each launch.
pub struct OutputStateMachine {
    classifiers: ClassifierSet,
    notifier: Arc<dyn Notifier>,
    seed_total: u32,
    snapshot: Snapshot,
}

impl OutputStateMachine {
    /// Create a monitor expecting `seed_total` units until the program
    /// reports its own count.
    pub fn new(seed_total: u32, classifiers: ClassifierSet) -> Self {
        Self {
            classifiers,
            notifier: Arc::new(NoopNotifier),
            seed_total,
            snapshot: Snapshot::initial(seed_total),
        }
    }

    /// Set the notifier receiving progress updates.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Feed one line. Returns the state after the line was applied.
    pub fn process_line(&mut self, line: &str) -> MonitorState {
        let classification = self.classifiers.classify(line);
        let Transition { next, emit } = transition(self.snapshot, &classification);

        if next.state != self.snapshot.state {
            tracing::trace!(from = ?self.snapshot.state, to = ?next.state, "monitor transition");
            if next.state.is_terminal() {
                tracing::debug!(state = ?next.state, line, "monitor reached a terminal state");
            }
        }
        self.snapshot = next;

        if let Some(progress) = emit {
            self.notifier.on_progress(progress.current, progress.total);
        }

        self.snapshot.state
    }

    /// Back to `Initializing` with `current_unit` zeroed and the seeded
    /// `total_unit` restored.
    pub fn reset(&mut self) {
        self.snapshot = Snapshot::initial(self.seed_total);
    }

    pub fn state(&self) -> MonitorState {
        self.snapshot.state
    }

    pub fn progress(&self) -> Progress {
        self.snapshot.progress
    }

    pub fn current_unit(&self) -> u32 {
        self.snapshot.progress.current
    }

    pub fn total_unit(&self) -> u32 {
        self.snapshot.progress.total
    }
}
