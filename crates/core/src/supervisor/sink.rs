//! Destinations for program output lines.

use crate::monitor::OutputStateMachine;
use std::fmt;

/// Which output channel a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    /// Severity used when the line is written to a log file.
    pub fn level(self) -> &'static str {
        match self {
            StreamKind::Stdout => "INFO",
            StreamKind::Stderr => "ERROR",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

/// Receives the lines of a supervised program, one stream per method.
///
/// Lines arrive without their terminator, in emission order per stream.
pub trait OutputSink {
    fn on_stdout(&mut self, line: &str);
    fn on_stderr(&mut self, line: &str);

    /// Dispatch on the stream a line came from.
    fn accept(&mut self, stream: StreamKind, line: &str) {
        match stream {
            StreamKind::Stdout => self.on_stdout(line),
            StreamKind::Stderr => self.on_stderr(line),
        }
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn on_stdout(&mut self, line: &str) {
        (**self).on_stdout(line);
    }

    fn on_stderr(&mut self, line: &str) {
        (**self).on_stderr(line);
    }
}

/// Both streams feed the same monitor.
impl OutputSink for OutputStateMachine {
    fn on_stdout(&mut self, line: &str) {
        self.process_line(line);
    }

    fn on_stderr(&mut self, line: &str) {
        self.process_line(line);
    }
}

/// Two independent closures, one per stream.
pub struct SplitSink<O, E> {
    stdout: O,
    stderr: E,
}

impl<O, E> SplitSink<O, E>
where
    O: FnMut(&str),
    E: FnMut(&str),
{
    pub fn new(stdout: O, stderr: E) -> Self {
        Self { stdout, stderr }
    }
}

impl<O, E> OutputSink for SplitSink<O, E>
where
    O: FnMut(&str),
    E: FnMut(&str),
{
    fn on_stdout(&mut self, line: &str) {
        (self.stdout)(line);
    }

    fn on_stderr(&mut self, line: &str) {
        (self.stderr)(line);
    }
}
