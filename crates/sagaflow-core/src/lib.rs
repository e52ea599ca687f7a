//! Core traits and types for the sagaflow workflow engine.
//!
//! This crate provides the abstractions without an async runtime.
//! Library authors should depend on this crate to implement custom steps
//! or storage adapters.
//!
//! # Core Types
//!
//! - [`Step`] - The core trait for workflow steps
//! - [`Rollback`] - Optional compensating action for a step
//! - [`Outcome`] - Two-variant result reported by steps and workflows
//! - [`Context`] - Token-keyed heterogeneous storage shared between steps
//! - [`StorageStrategy`] - Persistence contract for workflow and step status

mod context;
mod error;
mod outcome;
mod step;
mod storage;

pub use context::{Context, ContextToken};
pub use error::{BuildError, ContextError, RunError, StepFault};
pub use outcome::{error_result, success_result, Outcome};
pub use step::{rollback_guarded, run_guarded, Rollback, Step, StepName};
pub use storage::{InMemory, StorageStrategy, WorkflowStatus};

/// Macro to define a step with minimal boilerplate
///
/// This macro creates a step struct with:
/// - `const NAME: &'static str` - compile-time step name
/// - `Debug` derive
/// - `Default` implementation
///
/// # Example
///
/// ```rust
/// use sagaflow_core::define_step;
///
/// define_step!(ChargeCard);
/// assert_eq!(ChargeCard::NAME, "ChargeCard");
/// ```
#[macro_export]
macro_rules! define_step {
    ($name:ident) => {
        #[derive(Debug)]
        pub struct $name;

        impl $name {
            /// Step name as a compile-time constant
            #[allow(dead_code)]
            pub const NAME: &'static str = stringify!($name);
        }

        impl Default for $name {
            fn default() -> Self {
                Self
            }
        }
    };
}
