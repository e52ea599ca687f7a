//! Persistence contract consumed by the workflow engine.

use crate::step::StepName;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{self, Debug};

/// Lifecycle status of a workflow or of one of its steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    /// Not started yet.
    #[default]
    Pending,
    /// Steps are executing.
    Running,
    /// Every step succeeded.
    Completed,
    /// A step failed.
    Failed,
}

impl WorkflowStatus {
    /// Returns `true` for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns `true` if `self -> next` is a legal transition.
    ///
    /// `Pending -> Running -> {Completed, Failed}`; terminal states are final.
    pub fn can_transition_to(self, next: WorkflowStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Records workflow and step identities and their status transitions.
///
/// The engine only passes identifiers through; their representation belongs
/// to the adapter. Errors are not handled by the engine and abort the run.
///
/// # Examples
///
/// ```
/// use sagaflow_core::{StepName, StorageStrategy, WorkflowStatus};
/// use async_trait::async_trait;
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// #[derive(Debug, Default)]
/// struct Counter(AtomicU64);
///
/// #[async_trait]
/// impl StorageStrategy for Counter {
///     type Id = u64;
///     type Error = std::io::Error;
///
///     async fn store_workflow(&self, _name: &str) -> Result<u64, Self::Error> {
///         Ok(self.0.fetch_add(1, Ordering::Relaxed))
///     }
///
///     async fn update_workflow_status(&self, _id: &u64, _status: WorkflowStatus) -> Result<(), Self::Error> {
///         Ok(())
///     }
///
///     async fn store_step(&self, _workflow_id: &u64, _step_name: &StepName) -> Result<u64, Self::Error> {
///         Ok(self.0.fetch_add(1, Ordering::Relaxed))
///     }
///
///     async fn update_step_status(
///         &self,
///         _workflow_id: &u64,
///         _step_id: &u64,
///         _status: WorkflowStatus,
///     ) -> Result<(), Self::Error> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait StorageStrategy: Send + Sync {
    /// Opaque identifier chosen by the adapter.
    type Id: Clone + Debug + Send + Sync;
    /// Error raised by the backing store.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates a workflow record and returns its identifier.
    async fn store_workflow(&self, name: &str) -> Result<Self::Id, Self::Error>;

    /// Records a workflow status change.
    async fn update_workflow_status(
        &self,
        workflow_id: &Self::Id,
        status: WorkflowStatus,
    ) -> Result<(), Self::Error>;

    /// Creates a step record scoped to the workflow and returns its identifier.
    async fn store_step(
        &self,
        workflow_id: &Self::Id,
        step_name: &StepName,
    ) -> Result<Self::Id, Self::Error>;

    /// Records a step status change.
    async fn update_step_status(
        &self,
        workflow_id: &Self::Id,
        step_id: &Self::Id,
        status: WorkflowStatus,
    ) -> Result<(), Self::Error>;
}

/// Strategy used when no persistence is configured.
///
/// Every call succeeds immediately without side effects and identifiers
/// are `()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemory;

#[async_trait]
impl StorageStrategy for InMemory {
    type Id = ();
    type Error = Infallible;

    async fn store_workflow(&self, _name: &str) -> Result<(), Infallible> {
        Ok(())
    }

    async fn update_workflow_status(
        &self,
        _workflow_id: &(),
        _status: WorkflowStatus,
    ) -> Result<(), Infallible> {
        Ok(())
    }

    async fn store_step(&self, _workflow_id: &(), _step_name: &StepName) -> Result<(), Infallible> {
        Ok(())
    }

    async fn update_step_status(
        &self,
        _workflow_id: &(),
        _step_id: &(),
        _status: WorkflowStatus,
    ) -> Result<(), Infallible> {
        Ok(())
    }
}
