//! Workflow engine for executing steps.

use crate::report::{RunResult, WorkflowFailure, WorkflowReport};
use async_trait::async_trait;
use sagaflow_core::{
    rollback_guarded, run_guarded, BuildError, Context, InMemory, Outcome, Rollback, RunError,
    Step, StepFault, StepName, StorageStrategy, WorkflowStatus,
};
use std::fmt;
use tracing::{debug, info, warn};

/// A step with its output type erased, as stored by the engine.
#[async_trait]
trait StepHandle<E>: Send + Sync {
    fn name(&self) -> &StepName;

    fn has_rollback(&self) -> bool;

    async fn run(&self, ctx: &mut Context) -> Outcome<(), E>;

    async fn rollback(&self, ctx: &mut Context) -> Result<(), E>;
}

struct Forward<S> {
    name: StepName,
    step: S,
}

#[async_trait]
impl<S> StepHandle<S::Error> for Forward<S>
where
    S: Step + 'static,
    S::Error: From<StepFault>,
{
    fn name(&self) -> &StepName {
        &self.name
    }

    fn has_rollback(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &mut Context) -> Outcome<(), S::Error> {
        run_guarded(&self.step, ctx).await.map(|_| ())
    }

    async fn rollback(&self, _ctx: &mut Context) -> Result<(), S::Error> {
        Ok(())
    }
}

struct Compensated<S> {
    name: StepName,
    step: S,
}

#[async_trait]
impl<S> StepHandle<S::Error> for Compensated<S>
where
    S: Rollback + 'static,
    S::Error: From<StepFault>,
{
    fn name(&self) -> &StepName {
        &self.name
    }

    fn has_rollback(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &mut Context) -> Outcome<(), S::Error> {
        run_guarded(&self.step, ctx).await.map(|_| ())
    }

    async fn rollback(&self, ctx: &mut Context) -> Result<(), S::Error> {
        rollback_guarded(&self.step, ctx).await
    }
}

/// A sequential workflow with compensation.
///
/// Steps run one at a time in registration order. When a step fails, every
/// step that succeeded before it is rolled back in reverse order, then the
/// failure is returned as data. A workflow runs once: [`Workflow::run`]
/// consumes it.
///
/// `S` selects the persistence variant: [`InMemory`] (the default) makes no
/// persistence side effects, any other [`StorageStrategy`] records the run.
pub struct Workflow<E, S = InMemory> {
    name: String,
    steps: Vec<Box<dyn StepHandle<E>>>,
    context: Context,
    storage: S,
    current_step_index: usize,
    status: WorkflowStatus,
}

impl<E, S> fmt::Debug for Workflow<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.name)
            .field("steps", &self.step_names().collect::<Vec<_>>())
            .field("current_step_index", &self.current_step_index)
            .field("status", &self.status)
            .finish()
    }
}

impl<E> Workflow<E, InMemory>
where
    E: From<StepFault> + Send + 'static,
{
    /// Creates a new workflow builder.
    pub fn builder(name: impl Into<String>) -> WorkflowBuilder<E, InMemory> {
        WorkflowBuilder::new(name)
    }
}

impl<E, S> Workflow<E, S> {
    /// Returns the workflow name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of registered steps.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Returns the step names in execution order.
    pub fn step_names(&self) -> impl Iterator<Item = &StepName> {
        self.steps.iter().map(|s| s.name())
    }

    /// Returns the context the steps will receive.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Returns how many steps have succeeded so far.
    ///
    /// [`Workflow::run`] consumes the workflow, so this is always `0` here.
    /// After a run, read `steps_completed` from the report instead.
    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    /// Returns the engine's own status.
    ///
    /// A built workflow is always [`WorkflowStatus::Pending`]; the terminal
    /// status is carried by the run's report.
    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    fn transition(&mut self, next: WorkflowStatus) {
        debug_assert!(self.status.can_transition_to(next));
        debug!("Workflow '{}' {} -> {}", self.name, self.status, next);
        self.status = next;
    }
}

impl<E, S> Workflow<E, S>
where
    E: Send + 'static,
    S: StorageStrategy,
{
    /// Runs every step in order.
    ///
    /// Returns `Outcome::Success` with the workflow id once all steps
    /// succeed, or `Outcome::Error` naming the failing step after the steps
    /// before it were rolled back.
    ///
    /// # Errors
    ///
    /// Storage strategy errors propagate unchanged as [`RunError::Storage`].
    /// A failing rollback stops compensation and returns
    /// [`RunError::Rollback`].
    pub async fn run(mut self) -> RunResult<S::Id, E, S::Error> {
        self.transition(WorkflowStatus::Running);
        let workflow_id = self
            .storage
            .store_workflow(&self.name)
            .await
            .map_err(RunError::Storage)?;
        info!(
            "Workflow '{}' started with {} steps",
            self.name,
            self.steps.len()
        );

        for index in 0..self.steps.len() {
            let step = &self.steps[index];
            let step_id = self
                .storage
                .store_step(&workflow_id, step.name())
                .await
                .map_err(RunError::Storage)?;

            debug!(
                "Running step '{}' ({}/{})",
                step.name(),
                index + 1,
                self.steps.len()
            );
            match step.run(&mut self.context).await {
                Outcome::Success { .. } => {
                    self.storage
                        .update_step_status(&workflow_id, &step_id, WorkflowStatus::Completed)
                        .await
                        .map_err(RunError::Storage)?;
                    info!("Step '{}' completed successfully", step.name());
                    self.current_step_index += 1;
                }
                Outcome::Error { error } => {
                    warn!("Step '{}' failed", step.name());
                    return self.fail(workflow_id, step_id, index, error).await;
                }
            }
        }

        self.storage
            .update_workflow_status(&workflow_id, WorkflowStatus::Completed)
            .await
            .map_err(RunError::Storage)?;
        self.transition(WorkflowStatus::Completed);
        info!("Workflow '{}' completed", self.name);

        Ok(Outcome::success(WorkflowReport {
            id: workflow_id,
            steps_completed: self.current_step_index,
            status: self.status,
            context: self.context,
        }))
    }

    async fn fail(
        mut self,
        workflow_id: S::Id,
        step_id: S::Id,
        index: usize,
        error: E,
    ) -> RunResult<S::Id, E, S::Error> {
        let failed_step = self.steps[index].name().clone();

        tokio::try_join!(
            self.storage
                .update_step_status(&workflow_id, &step_id, WorkflowStatus::Failed),
            self.storage
                .update_workflow_status(&workflow_id, WorkflowStatus::Failed),
        )
        .map_err(RunError::Storage)?;
        self.transition(WorkflowStatus::Failed);

        for step in self.steps[..self.current_step_index].iter().rev() {
            if !step.has_rollback() {
                debug!("Step '{}' has no rollback, skipping", step.name());
                continue;
            }
            info!("Rolling back step '{}'", step.name());
            if let Err(rollback_error) = step.rollback(&mut self.context).await {
                warn!(
                    "Rollback of step '{}' failed, compensation for '{}' aborted",
                    step.name(),
                    failed_step
                );
                return Err(RunError::Rollback {
                    step_name: step.name().clone(),
                    failed_step,
                    error: rollback_error,
                    cause: error,
                });
            }
        }

        warn!(
            "Workflow '{}' failed at step '{}', {} step(s) compensated",
            self.name, failed_step, self.current_step_index
        );
        Ok(Outcome::error(WorkflowFailure {
            id: workflow_id,
            failed_step,
            error,
            steps_completed: self.current_step_index,
            status: self.status,
            context: self.context,
        }))
    }
}

/// Builder for constructing [`Workflow`] instances.
pub struct WorkflowBuilder<E, S = InMemory> {
    name: String,
    steps: Vec<Box<dyn StepHandle<E>>>,
    context: Context,
    storage: S,
}

impl<E, S> fmt::Debug for WorkflowBuilder<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowBuilder")
            .field("name", &self.name)
            .field("steps", &self.steps.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl<E> WorkflowBuilder<E, InMemory>
where
    E: From<StepFault> + Send + 'static,
{
    /// Creates a builder for an in-memory workflow.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            context: Context::new(),
            storage: InMemory,
        }
    }
}

impl<E, S> WorkflowBuilder<E, S>
where
    E: From<StepFault> + Send + 'static,
    S: StorageStrategy,
{
    /// Appends a step without a compensating action.
    pub fn step<T>(mut self, step: T) -> Self
    where
        T: Step<Error = E> + 'static,
    {
        let name = step.name();
        self.steps.push(Box::new(Forward { name, step }));
        self
    }

    /// Appends a step whose [`Rollback`] runs if a later step fails.
    pub fn compensated_step<T>(mut self, step: T) -> Self
    where
        T: Rollback<Error = E> + 'static,
    {
        let name = step.name();
        self.steps.push(Box::new(Compensated { name, step }));
        self
    }

    /// Persists the run through `storage`.
    pub fn storage<S2: StorageStrategy>(self, storage: S2) -> WorkflowBuilder<E, S2> {
        WorkflowBuilder {
            name: self.name,
            steps: self.steps,
            context: self.context,
            storage,
        }
    }

    /// Pre-populates the context before the first step runs.
    pub fn setup_context<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut Context),
    {
        setup(&mut self.context);
        self
    }

    /// Builds the workflow.
    pub fn build(self) -> Result<Workflow<E, S>, BuildError> {
        if self.name.trim().is_empty() {
            return Err(BuildError::Configuration(
                "Workflow name must not be empty".to_string(),
            ));
        }
        if let Some(position) = self.steps.iter().position(|s| s.name().is_blank()) {
            return Err(BuildError::Configuration(format!(
                "Step at position {} has an empty name",
                position
            )));
        }

        Ok(Workflow {
            name: self.name,
            steps: self.steps,
            context: self.context,
            storage: self.storage,
            current_step_index: 0,
            status: WorkflowStatus::Pending,
        })
    }
}
