//! Step traits and the panic-guarded step wrapper.

use crate::context::Context;
use crate::error::StepFault;
use crate::outcome::Outcome;
use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::panic::AssertUnwindSafe;

/// Type-safe step name wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepName(String);

impl StepName {
    /// Creates a new StepName.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a StepName from a type's name (last path segment).
    pub fn from_type_name<T: ?Sized>() -> Self {
        let full_name = std::any::type_name::<T>();
        let short_name = full_name.rsplit("::").next().unwrap_or(full_name);
        Self::new(short_name)
    }

    /// Returns the step name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the name is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StepName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StepName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for StepName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for StepName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for StepName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A unit of work in a workflow.
///
/// `run` must always return an [`Outcome`]; the engine never wraps plain
/// values. A panic inside `run` is caught by the engine and reported as
/// `Outcome::Error` carrying a [`StepFault`] converted into `Self::Error`.
///
/// # Examples
///
/// ```
/// use sagaflow_core::{Context, ContextToken, Outcome, Step, StepFault, StepName};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct Greet {
///     greeting: ContextToken<String>,
/// }
///
/// #[async_trait]
/// impl Step for Greet {
///     type Output = ();
///     type Error = StepFault;
///
///     async fn run(&self, ctx: &mut Context) -> Outcome<(), StepFault> {
///         ctx.set(&self.greeting, "hello".to_string());
///         Outcome::success(())
///     }
///
///     fn name(&self) -> StepName {
///         StepName::new("greet")
///     }
/// }
/// ```
#[async_trait]
pub trait Step: Send + Sync + Debug {
    /// Data produced on success.
    type Output: Send;
    /// Error produced on failure.
    type Error: Send;

    /// Executes the step.
    async fn run(&self, ctx: &mut Context) -> Outcome<Self::Output, Self::Error>;

    /// Returns the step name.
    ///
    /// By default, uses the type name. Override to provide a custom name.
    fn name(&self) -> StepName {
        StepName::from_type_name::<Self>()
    }
}

/// Optional compensating action for a [`Step`].
///
/// Only invoked when the step previously succeeded and a later step failed.
#[async_trait]
pub trait Rollback: Step {
    /// Undoes the effects of a successful `run`.
    ///
    /// An error aborts the remaining compensation pass.
    async fn rollback(&self, ctx: &mut Context) -> Result<(), Self::Error>;
}

/// Runs a step, converting a panic into an error outcome.
///
/// Never panics past its own boundary.
pub async fn run_guarded<S>(step: &S, ctx: &mut Context) -> Outcome<S::Output, S::Error>
where
    S: Step + ?Sized,
    S::Error: From<StepFault>,
{
    match AssertUnwindSafe(step.run(ctx)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => Outcome::error(StepFault::from_panic(payload).into()),
    }
}

/// Runs a step's rollback, converting a panic into an error.
pub async fn rollback_guarded<S>(step: &S, ctx: &mut Context) -> Result<(), S::Error>
where
    S: Rollback + ?Sized,
    S::Error: From<StepFault>,
{
    match AssertUnwindSafe(step.rollback(ctx)).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(StepFault::from_panic(payload).into()),
    }
}
