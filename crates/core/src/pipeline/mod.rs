//! Sequential step pipeline.
//!
//! The Pipeline is responsible for executing registered steps in order,
//! stopping at the first failure and recording which step is active.
//! There are no retries, no parallelism and no dependency graph: order is
//! exactly registration order.

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;
use tracing::{error, info};
use uuid::Uuid;
use wr_protocol::ipc::Event;
use wr_protocol::pipeline_models::PipelineReport;

/// One unit of pipeline work.
#[async_trait]
pub trait Step: Send {
    /// Execute the step. `true` means success.
    async fn run(&mut self) -> bool;

    /// Human readable label, e.g. the program name.
    fn description(&self) -> &str;

    /// Why the last `run` returned `false`, if the step knows.
    fn failure(&self) -> Option<String> {
        None
    }
}

/// Runs borrowed steps one after another.
///
/// Steps are owned by the caller and only referenced here, so their state
/// (last result, last error) stays inspectable after the run.
///
/// # Example
///
/// ```no_run
/// use wr_core::pipeline::{Pipeline, Step};
///
/// # async fn example(geogrid: &mut dyn Step, ungrib: &mut dyn Step) {
/// let mut pipeline = Pipeline::new();
/// pipeline.add_step(geogrid).add_step(ungrib);
///
/// if !pipeline.run_all().await {
///     eprintln!("failed at {:?}", pipeline.current_description());
/// }
/// # }
/// ```
pub struct Pipeline<'a> {
    session_id: Uuid,
    steps: Vec<&'a mut dyn Step>,
    current: Option<usize>,
    result: Option<bool>,
    events_tx: Option<Sender<Event>>,
}

impl<'a> Default for Pipeline<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Pipeline<'a> {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            steps: Vec::new(),
            current: None,
            result: None,
            events_tx: None,
        }
    }

    /// Send lifecycle events to this channel while running.
    pub fn with_events(mut self, events_tx: Sender<Event>) -> Self {
        self.events_tx = Some(events_tx);
        self
    }

    /// Append a step. Returns `self` for chained registration.
    pub fn add_step(&mut self, step: &'a mut dyn Step) -> &mut Self {
        self.steps.push(step);
        self
    }

    /// Run every step in registration order.
    ///
    /// Stops at the first step returning `false` and returns `false`
    /// without running the remaining steps. Returns `true` once all steps
    /// succeeded.
    pub async fn run_all(&mut self) -> bool {
        info!(session_id = %self.session_id, steps = self.steps.len(), "pipeline started");
        self.emit(Event::PipelineStarted {
            session_id: self.session_id,
            step_count: self.steps.len(),
        })
        .await;

        let mut success = true;
        for index in 0..self.steps.len() {
            self.current = Some(index);

            let description = self.steps[index].description().to_string();
            info!(step = index, %description, "step started");
            self.emit(Event::StepStarted {
                session_id: self.session_id,
                step_index: index,
                description: description.clone(),
            })
            .await;

            let step_success = self.steps[index].run().await;

            self.emit(Event::StepFinished {
                session_id: self.session_id,
                step_index: index,
                success: step_success,
            })
            .await;

            if !step_success {
                error!(step = index, %description, "step failed, stopping pipeline");
                success = false;
                break;
            }
            info!(step = index, %description, "step succeeded");
        }

        if success {
            self.current = None;
        }
        self.result = Some(success);

        info!(session_id = %self.session_id, success, "pipeline finished");
        self.emit(Event::PipelineFinished {
            session_id: self.session_id,
            success,
        })
        .await;

        success
    }

    /// Index of the step currently running, or of the failing step once
    /// `run_all` returned `false`.
    pub fn current_step(&self) -> Option<usize> {
        self.current
    }

    pub fn current_description(&self) -> Option<&str> {
        self.current
            .and_then(|index| self.steps.get(index))
            .map(|step| step.description())
    }

    /// Failure reported by the failing step once `run_all` returned `false`.
    pub fn failure(&self) -> Option<String> {
        if self.result != Some(false) {
            return None;
        }
        self.current
            .and_then(|index| self.steps.get(index))
            .and_then(|step| step.failure())
    }

    /// Overall result of the last `run_all`.
    pub fn result(&self) -> Option<bool> {
        self.result
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn report(&self) -> PipelineReport {
        PipelineReport {
            session_id: self.session_id,
            steps: self
                .steps
                .iter()
                .map(|step| step.description().to_string())
                .collect(),
            current_step: self.current,
            result: self.result,
        }
    }

    async fn emit(&self, event: Event) {
        if let Some(tx) = &self.events_tx {
            let _ = tx.send(event).await;
        }
    }
}
