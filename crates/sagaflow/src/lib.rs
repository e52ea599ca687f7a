//! A sequential saga workflow engine for Rust.
//!
//! Steps run one after another and share a [`Context`]. When a step fails,
//! the steps that already succeeded are rolled back in reverse order and the
//! run reports which step failed together with its original error. Progress
//! can optionally be persisted through a [`StorageStrategy`].
//!
//! # Example
//!
//! ```rust
//! use sagaflow::prelude::*;
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! struct ReserveStock {
//!     reserved: ContextToken<u32>,
//! }
//!
//! #[async_trait]
//! impl Step for ReserveStock {
//!     type Output = ();
//!     type Error = StepFault;
//!
//!     async fn run(&self, ctx: &mut Context) -> Outcome<(), StepFault> {
//!         ctx.set(&self.reserved, 3);
//!         Outcome::success(())
//!     }
//! }
//!
//! #[async_trait]
//! impl Rollback for ReserveStock {
//!     async fn rollback(&self, ctx: &mut Context) -> Result<(), StepFault> {
//!         ctx.remove(&self.reserved);
//!         Ok(())
//!     }
//! }
//!
//! define_step!(ChargeCard);
//!
//! #[async_trait]
//! impl Step for ChargeCard {
//!     type Output = ();
//!     type Error = StepFault;
//!
//!     async fn run(&self, _ctx: &mut Context) -> Outcome<(), StepFault> {
//!         Outcome::error(StepFault::new("card declined"))
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let reserved = ContextToken::new("reserved");
//! let workflow = Workflow::builder("checkout")
//!     .compensated_step(ReserveStock { reserved })
//!     .step(ChargeCard)
//!     .build()
//!     .expect("valid workflow");
//!
//! match workflow.run().await.expect("in-memory runs have no storage faults") {
//!     Outcome::Success { .. } => unreachable!(),
//!     Outcome::Error { error: failure } => {
//!         assert_eq!(failure.failed_step, ChargeCard::NAME);
//!         assert_eq!(failure.context.get(&reserved), None);
//!     }
//! }
//! # }
//! ```

mod report;
mod workflow;

// Re-export core types
pub use sagaflow_core::*;

pub use report::{RunResult, WorkflowFailure, WorkflowReport};
pub use workflow::{Workflow, WorkflowBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        define_step, error_result, success_result, Context, ContextToken, InMemory, Outcome,
        Rollback, RunError, Step, StepFault, StepName, StorageStrategy, Workflow,
        WorkflowBuilder, WorkflowFailure, WorkflowReport, WorkflowStatus,
    };
}
