//! Workflow error types.

use crate::step::StepName;
use std::any::Any;
use thiserror::Error;

/// Errors raised by [`Context`](crate::Context) accessors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContextError {
    /// The token's slot was never set in this context.
    #[error("{key} is not defined in this context")]
    NotDefined {
        /// Diagnostic name of the token.
        key: String,
    },
}

/// A panic caught at a step boundary.
///
/// Step error types implement `From<StepFault>` so the engine can report a
/// panicking step as an ordinary error result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("step panicked: {message}")]
pub struct StepFault {
    message: String,
}

impl StepFault {
    /// Creates a fault with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Builds a fault from a panic payload, keeping its message when the
    /// payload is a string.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_string(),
                Err(_) => "non-string panic payload".to_string(),
            },
        };
        Self { message }
    }

    /// Returns the panic message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors returned when building a workflow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildError {
    /// The workflow configuration is invalid.
    #[error("Invalid workflow configuration: {0}")]
    Configuration(String),
}

/// Faults that abort a workflow run instead of producing an outcome.
///
/// Step failures are never reported here; they come back as data in the
/// run's outcome.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RunError<S, E> {
    /// A storage strategy call failed. The run stopped at that call.
    #[error("storage strategy call failed: {0}")]
    Storage(#[source] S),

    /// A rollback failed, aborting the rest of the compensation pass.
    #[error("rollback of step '{step_name}' failed while compensating for '{failed_step}'")]
    Rollback {
        /// The step whose rollback failed.
        step_name: StepName,
        /// The step whose failure triggered compensation.
        failed_step: StepName,
        /// Error returned by the rollback.
        error: E,
        /// Error returned by the failing step.
        cause: E,
    },
}
