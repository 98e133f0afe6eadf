//! Pipeline steps that run one external program.
//!
//! A [`ProgramStep`] writes the program's configuration file, launches the
//! program through a [`ProcessSupervisor`] and judges the run with its own
//! [`OutputStateMachine`]. The WPS programs are built by the factories in
//! [`wps`], real.exe and wrf.exe by those in [`wrf`].

pub mod wps;
pub mod wrf;

use crate::config::ConfigError;
use crate::monitor::{ClassifierSet, OutputStateMachine};
use crate::notifier::Notifier;
use crate::pipeline::Step;
use crate::supervisor::{LineLog, ProcessSupervisor, StreamKind, SupervisorError};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use wr_protocol::ProcessResult;

/// Produces the text of the program's configuration file.
pub type ConfigRenderer = Box<dyn Fn() -> Result<String, ConfigError> + Send + Sync>;

/// Errors that stop a step before it can report a [`ProcessResult`].
#[derive(Error, Debug)]
pub enum StepError {
    /// The configuration could not be produced. Nothing was spawned.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The working directory could not be made absolute. Nothing was spawned.
    #[error("Failed to resolve working directory {path}: {source}")]
    WorkingDir { path: PathBuf, source: io::Error },

    /// The configuration file could not be written. Nothing was spawned.
    #[error("Failed to write configuration file {path}: {source}")]
    WriteConfig { path: PathBuf, source: io::Error },

    /// A program output file could not be removed or read.
    #[error("Failed to access program output {path}: {source}")]
    OutputFile { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

/// One external program as a pipeline step.
///
/// # Example
///
/// ```no_run
/// use wr_core::monitor::ClassifierSet;
/// use wr_core::pipeline::Step;
/// use wr_core::steps::ProgramStep;
///
/// # async fn example() {
/// let mut step = ProgramStep::new(
///     "geogrid",
///     "geogrid.exe",
///     "/opt/WPS",
///     Box::new(|| Ok("&share\n/\n".to_string())),
///     3,
///     ClassifierSet::wps("geogrid"),
/// )
/// .with_log_file("/tmp/geogrid.log");
///
/// if !step.run().await {
///     eprintln!("geogrid failed: {:?}", step.last_error());
/// }
/// # }
/// ```
pub struct ProgramStep {
    description: String,
    executable: String,
    working_dir: PathBuf,
    config_file: String,
    render_config: ConfigRenderer,
    machine: OutputStateMachine,
    launcher: Vec<String>,
    log_file: Option<PathBuf>,
    output_file: Option<String>,
    cancel: CancellationToken,
    last_result: Option<ProcessResult>,
    last_error: Option<StepError>,
}

impl ProgramStep {
    /// Create a step running `<working_dir>/<executable>`.
    ///
    /// # Arguments
    ///
    /// * `description` - Label shown in logs and pipeline reports
    /// * `executable` - File name of the program inside `working_dir`
    /// * `working_dir` - Directory the program runs in and reads its configuration from
    /// * `render_config` - Produces the configuration file content
    /// * `seed_total` - Expected unit count until the program reports its own
    /// * `classifiers` - Line predicates for the output monitor
    pub fn new(
        description: impl Into<String>,
        executable: impl Into<String>,
        working_dir: impl Into<PathBuf>,
        render_config: ConfigRenderer,
        seed_total: u32,
        classifiers: ClassifierSet,
    ) -> Self {
        Self {
            description: description.into(),
            executable: executable.into(),
            working_dir: working_dir.into(),
            config_file: crate::namelist::wps::WPS_NAMELIST_FILE.to_string(),
            render_config,
            machine: OutputStateMachine::new(seed_total, classifiers),
            launcher: Vec::new(),
            log_file: None,
            output_file: None,
            cancel: CancellationToken::new(),
            last_result: None,
            last_error: None,
        }
    }

    /// Name of the configuration file written into the working directory.
    pub fn with_config_file(mut self, name: impl Into<String>) -> Self {
        self.config_file = name.into();
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.machine = self.machine.with_notifier(notifier);
        self
    }

    /// Append the program output to this file.
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Start the program through a command prefix, e.g. `mpirun -n 1`.
    pub fn with_launcher<I, A>(mut self, launcher: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.launcher = launcher.into_iter().map(Into::into).collect();
        self
    }

    /// A file the program writes its messages to instead of stdout, e.g.
    /// `rsl.error.0000` under MPI. A stale copy is removed before the launch
    /// and its lines are fed to the monitor after the program exits.
    pub fn with_output_file(mut self, name: impl Into<String>) -> Self {
        self.output_file = Some(name.into());
        self
    }

    /// Kill the program and fail the step when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn monitor(&self) -> &OutputStateMachine {
        &self.machine
    }

    /// Result of the last launch that got as far as spawning.
    pub fn last_result(&self) -> Option<ProcessResult> {
        self.last_result
    }

    /// Error of the last `run`, if it failed before producing a result.
    pub fn last_error(&self) -> Option<&StepError> {
        self.last_error.as_ref()
    }

    /// Write the configuration, launch the program and wait for it.
    ///
    /// # Errors
    ///
    /// Returns `StepError` if the configuration cannot be rendered or
    /// written, or if supervision fails (spawn, IO, cancellation). A program
    /// that runs but fails is not an error: see [`ProcessResult`].
    pub async fn execute(&mut self) -> Result<ProcessResult, StepError> {
        let content = (self.render_config)()?;

        // The program path is handed to a child running inside the working
        // directory, so a relative directory would be resolved twice.
        let working_dir =
            std::path::absolute(&self.working_dir).map_err(|source| StepError::WorkingDir {
                path: self.working_dir.clone(),
                source,
            })?;

        let config_path = working_dir.join(&self.config_file);
        tokio::fs::write(&config_path, content)
            .await
            .map_err(|source| StepError::WriteConfig {
                path: config_path.clone(),
                source,
            })?;
        info!(step = %self.description, path = %config_path.display(), "configuration written");

        let output_path = self.output_file.as_ref().map(|name| working_dir.join(name));
        if let Some(path) = &output_path {
            remove_stale_output(path).await?;
        }

        self.machine.reset();

        let program = working_dir.join(&self.executable);
        let (executable, args) = match self.launcher.split_first() {
            Some((launcher, prefix)) => {
                let mut args = prefix.to_vec();
                args.push(program.to_string_lossy().into_owned());
                (PathBuf::from(launcher), args)
            }
            None => (program, Vec::new()),
        };

        let exit_code = {
            let mut supervisor = ProcessSupervisor::new(executable, &mut self.machine)
                .with_args(args)
                .with_working_dir(&working_dir)
                .with_name(self.executable.as_str());
            if let Some(log_file) = &self.log_file {
                supervisor = supervisor.with_log_file(log_file);
            }
            supervisor.run_until_cancelled(&self.cancel).await?
        };

        if let Some(path) = &output_path {
            self.replay_output(path).await?;
        }

        Ok(ProcessResult {
            exit_code,
            terminal_state: self.machine.state(),
        })
    }

    /// Feed the lines of a program output file to the monitor and the log
    /// file. A missing file means the program wrote to stdout instead.
    async fn replay_output(&mut self, path: &Path) -> Result<(), StepError> {
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(StepError::OutputFile {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut log = match &self.log_file {
            Some(log_file) => Some(LineLog::open(log_file, &self.executable).map_err(|source| {
                StepError::OutputFile {
                    path: log_file.clone(),
                    source,
                }
            })?),
            None => None,
        };

        let text = String::from_utf8_lossy(&content);
        let mut count = 0usize;
        for line in text.lines() {
            if let Some(log) = log.as_mut() {
                if let Err(e) = log.write(StreamKind::Stdout, line) {
                    warn!(path = %log.path().display(), error = %e, "log write failed");
                }
            }
            self.machine.process_line(line);
            count += 1;
        }
        if let Some(log) = log {
            if let Err(e) = log.finish() {
                warn!(error = %e, "log flush failed");
            }
        }
        info!(
            step = %self.description,
            path = %path.display(),
            lines = count,
            "program output read"
        );
        Ok(())
    }

    /// Why the last `run` failed, for reporting.
    pub fn failure_reason(&self) -> Option<String> {
        if let Some(error) = &self.last_error {
            return Some(error.to_string());
        }
        let result = self.last_result?;
        if result.is_success() {
            return None;
        }
        let exit = result
            .exit_code
            .map_or_else(|| "killed by a signal".to_string(), |code| format!("exit code {code}"));
        Some(format!("{exit}, monitor state {:?}", result.terminal_state))
    }
}

async fn remove_stale_output(path: &Path) -> Result<(), StepError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            info!(path = %path.display(), "removed output of a previous run");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StepError::OutputFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[async_trait]
impl Step for ProgramStep {
    /// `true` only if the program exited with 0 and its completion line was
    /// seen without any error line.
    async fn run(&mut self) -> bool {
        match self.execute().await {
            Ok(result) => {
                self.last_result = Some(result);
                self.last_error = None;

                if !result.is_success() {
                    warn!(
                        step = %self.description,
                        exit_code = ?result.exit_code,
                        state = ?result.terminal_state,
                        "program did not complete successfully"
                    );
                }
                result.is_success()
            }
            Err(e) => {
                error!(step = %self.description, error = %e, "step failed");
                self.last_result = None;
                self.last_error = Some(e);
                false
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn failure(&self) -> Option<String> {
        self.failure_reason()
    }
}

impl std::fmt::Debug for ProgramStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramStep")
            .field("description", &self.description)
            .field("executable", &self.executable)
            .field("working_dir", &self.working_dir)
            .field("launcher", &self.launcher)
            .field("state", &self.machine.state())
            .finish_non_exhaustive()
    }
}
