//! Supervision of one external program launch.
//!
//! [`ProcessSupervisor`] spawns a program with both output channels piped,
//! drains stdout and stderr concurrently line by line into an
//! [`OutputSink`], optionally appends every line to a log file, and returns
//! the exit code once both streams are closed and the child has exited.
//!
//! Draining the streams one after the other can deadlock: the child blocks
//! writing to the pipe nobody reads once its buffer fills. Here both streams
//! are merged into a single stream of lines and consumed by one loop.

pub mod line_log;
pub mod sink;

pub use line_log::LineLog;
pub use sink::{OutputSink, SplitSink, StreamKind};

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio_stream::wrappers::SplitStream;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that end a supervised run early.
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The program could not be started (missing, not executable, ...).
    #[error("Failed to spawn program {program}: {source}")]
    Spawn { program: PathBuf, source: io::Error },

    /// A piped stream was not available on the child handle.
    #[error("Failed to capture {stream} of the child process")]
    StreamCapture { stream: StreamKind },

    /// Reading from one of the output pipes failed.
    #[error("Failed to read program output: {0}")]
    Read(#[source] io::Error),

    /// The log file could not be opened or written.
    #[error("Failed to write log file {path}: {source}")]
    Log { path: PathBuf, source: io::Error },

    /// Waiting for the child to exit failed.
    #[error("Failed to wait for program exit: {0}")]
    Wait(#[source] io::Error),

    /// The caller cancelled the run; the child has been killed.
    #[error("Program run was cancelled")]
    Cancelled,
}

/// Runs one program to completion, streaming its output to a sink.
///
/// # Example
///
/// ```no_run
/// use wr_core::supervisor::{ProcessSupervisor, SplitSink};
///
/// # async fn example() -> Result<(), wr_core::supervisor::SupervisorError> {
/// let sink = SplitSink::new(
///     |line: &str| println!("out: {line}"),
///     |line: &str| eprintln!("err: {line}"),
/// );
/// let mut supervisor = ProcessSupervisor::new("./geogrid.exe", sink)
///     .with_working_dir("/opt/WPS")
///     .with_log_file("/tmp/geogrid.log");
///
/// let exit_code = supervisor.run().await?;
/// println!("geogrid exited with {exit_code:?}");
/// # Ok(())
/// # }
/// ```
pub struct ProcessSupervisor<S> {
    executable: PathBuf,
    name: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    log_path: Option<PathBuf>,
    sink: S,
}

impl<S: OutputSink> ProcessSupervisor<S> {
    /// Create a supervisor for `executable`, forwarding output to `sink`.
    pub fn new(executable: impl Into<PathBuf>, sink: S) -> Self {
        let executable = executable.into();
        let name = executable
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| executable.to_string_lossy().into_owned());

        Self {
            executable,
            name,
            args: Vec::new(),
            working_dir: None,
            log_path: None,
            sink,
        }
    }

    /// Arguments passed to the executable.
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Working directory of the child. The supervisor never changes the
    /// directory of the current process.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Append every line to this file.
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Name used in log entries. Defaults to the executable's file name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Run the program to completion. See [`Self::run_until_cancelled`].
    pub async fn run(&mut self) -> Result<Option<i32>, SupervisorError> {
        self.run_until_cancelled(&CancellationToken::new()).await
    }

    /// Run the program until it exits or `cancel` fires.
    ///
    /// Returns the exit code, or `None` when the child was terminated by a
    /// signal. On cancellation the child is killed and
    /// [`SupervisorError::Cancelled`] is returned.
    pub async fn run_until_cancelled(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<i32>, SupervisorError> {
        let mut log = self.open_log()?;
        let mut child = self.spawn()?;

        let stdout = child.stdout.take().ok_or(SupervisorError::StreamCapture {
            stream: StreamKind::Stdout,
        })?;
        let stderr = child.stderr.take().ok_or(SupervisorError::StreamCapture {
            stream: StreamKind::Stderr,
        })?;

        let lines = line_stream(stdout, StreamKind::Stdout)
            .merge(line_stream(stderr, StreamKind::Stderr));
        tokio::pin!(lines);

        let drained = tokio::select! {
            result = drain(&mut lines, &mut self.sink, log.as_mut(), &self.name) => result,
            _ = cancel.cancelled() => Err(SupervisorError::Cancelled),
        };

        let line_count = match drained {
            Ok(count) => count,
            Err(e) => {
                terminate(&mut child, &self.name).await;
                return Err(e);
            }
        };

        let status = tokio::select! {
            status = child.wait() => status.map_err(SupervisorError::Wait)?,
            _ = cancel.cancelled() => {
                terminate(&mut child, &self.name).await;
                return Err(SupervisorError::Cancelled);
            }
        };

        if let Some(log) = log {
            let path = log.path().to_path_buf();
            log.finish()
                .map_err(|source| SupervisorError::Log { path, source })?;
        }

        info!(
            program = %self.name,
            lines = line_count,
            exit_code = ?status.code(),
            "program finished"
        );

        Ok(status.code())
    }

    fn open_log(&self) -> Result<Option<LineLog>, SupervisorError> {
        self.log_path
            .as_deref()
            .map(|path| {
                LineLog::open(path, &self.name).map_err(|source| SupervisorError::Log {
                    path: path.to_path_buf(),
                    source,
                })
            })
            .transpose()
    }

    fn spawn(&self) -> Result<Child, SupervisorError> {
        let mut cmd = Command::new(&self.executable);
        cmd.args(&self.args);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| SupervisorError::Spawn {
            program: self.executable.clone(),
            source,
        })?;

        info!(
            program = %self.name,
            executable = %self.executable.display(),
            working_dir = ?self.working_dir.as_deref().map(Path::display),
            "program started"
        );

        Ok(child)
    }
}

/// Lines of one pipe, tagged with the stream they came from.
fn line_stream<R>(
    reader: R,
    kind: StreamKind,
) -> impl Stream<Item = io::Result<(StreamKind, String)>>
where
    R: AsyncRead + Unpin,
{
    SplitStream::new(BufReader::new(reader).split(b'\n'))
        .map(move |chunk| chunk.map(|bytes| (kind, decode_line(&bytes))))
}

/// Lossy UTF-8 decoding with a trailing `\r` removed. Noisy bytes never
/// stop the drain.
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

async fn drain<L, S>(
    lines: &mut L,
    sink: &mut S,
    mut log: Option<&mut LineLog>,
    program: &str,
) -> Result<usize, SupervisorError>
where
    L: Stream<Item = io::Result<(StreamKind, String)>> + Unpin,
    S: OutputSink,
{
    let mut count = 0;
    while let Some(item) = lines.next().await {
        let (stream, line) = item.map_err(SupervisorError::Read)?;
        debug!(program, %stream, "{line}");

        if let Some(log) = log.as_deref_mut() {
            log.write(stream, &line).map_err(|source| SupervisorError::Log {
                path: log.path().to_path_buf(),
                source,
            })?;
        }

        sink.accept(stream, &line);
        count += 1;
    }
    Ok(count)
}

async fn terminate(child: &mut Child, program: &str) {
    if let Err(e) = child.kill().await {
        warn!(program, error = %e, "failed to kill program");
    } else {
        info!(program, "program killed");
    }
}
