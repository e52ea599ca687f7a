//! Values returned by a workflow run.

use sagaflow_core::{Context, Outcome, RunError, StepName, WorkflowStatus};
use std::fmt;

/// Successful run: every step completed.
#[derive(Debug)]
pub struct WorkflowReport<Id> {
    /// Identifier from the storage strategy (`()` without persistence).
    pub id: Id,
    /// Number of steps that succeeded. Equals the step count.
    pub steps_completed: usize,
    /// Terminal status of the engine, always [`WorkflowStatus::Completed`].
    pub status: WorkflowStatus,
    /// Context as left by the last step.
    pub context: Context,
}

/// Failed run: one step returned an error and earlier steps were compensated.
#[derive(Debug)]
pub struct WorkflowFailure<Id, E> {
    /// Identifier from the storage strategy (`()` without persistence).
    pub id: Id,
    /// The step whose `run` failed.
    pub failed_step: StepName,
    /// The error that step returned, unchanged.
    pub error: E,
    /// Number of steps that succeeded before the failure.
    pub steps_completed: usize,
    /// Terminal status of the engine, always [`WorkflowStatus::Failed`].
    pub status: WorkflowStatus,
    /// Context after compensation.
    pub context: Context,
}

impl<Id, E: fmt::Display> fmt::Display for WorkflowFailure<Id, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step '{}' failed: {}", self.failed_step, self.error)
    }
}

/// Return type of [`Workflow::run`](crate::Workflow::run).
///
/// The outer `Result` carries faults that aborted the run (storage errors,
/// failed rollbacks); the inner [`Outcome`] is the workflow's own report.
pub type RunResult<Id, E, SE> =
    Result<Outcome<WorkflowReport<Id>, WorkflowFailure<Id, E>>, RunError<SE, E>>;
