mod common;

use async_trait::async_trait;
use common::{Journal, Scripted, TestError, Undo};
use sagaflow::prelude::*;

#[tokio::test]
async fn test_all_steps_succeed() {
    let journal = Journal::default();
    let workflow = Workflow::builder("happy")
        .compensated_step(Scripted::ok("A", &journal))
        .compensated_step(Scripted::ok("B", &journal))
        .step(Scripted::ok("C", &journal))
        .build()
        .expect("valid workflow");

    let outcome = workflow.run().await.expect("no storage faults");

    assert!(outcome.is_ok());
    let report = outcome.ok().expect("success");
    assert_eq!(report.steps_completed, 3);
    assert_eq!(report.status, WorkflowStatus::Completed);
    assert_eq!(journal.runs(), vec!["A", "B", "C"]);
    assert!(journal.rollbacks().is_empty());
}

#[tokio::test]
async fn test_failure_rolls_back_in_reverse() {
    let journal = Journal::default();
    let workflow = Workflow::builder("saga")
        .compensated_step(Scripted::ok("A", &journal))
        .compensated_step(Scripted::ok("B", &journal))
        .compensated_step(Scripted::failing("C", "boom", &journal))
        .build()
        .expect("valid workflow");

    let outcome = workflow.run().await.expect("no storage faults");

    assert!(outcome.is_err());
    let failure = outcome.err().expect("failure");
    assert_eq!(failure.failed_step, "C");
    assert_eq!(failure.error, TestError::Step("boom".to_string()));
    assert_eq!(failure.steps_completed, 2);
    assert_eq!(failure.status, WorkflowStatus::Failed);
    assert_eq!(journal.rollbacks(), vec!["B", "A"]);
}

#[tokio::test]
async fn test_steps_without_rollback_are_skipped() {
    let journal = Journal::default();
    let workflow = Workflow::builder("mixed")
        .compensated_step(Scripted::ok("A", &journal))
        .step(Scripted::ok("B", &journal))
        .compensated_step(Scripted::ok("C", &journal))
        .compensated_step(Scripted::failing("D", "nope", &journal))
        .compensated_step(Scripted::ok("E", &journal))
        .build()
        .expect("valid workflow");

    let failure = workflow
        .run()
        .await
        .expect("no storage faults")
        .err()
        .expect("failure");

    assert_eq!(failure.failed_step, "D");
    assert_eq!(journal.runs(), vec!["A", "B", "C", "D"]);
    assert_eq!(journal.rollbacks(), vec!["C", "A"]);
}

#[tokio::test]
async fn test_first_step_failure_rolls_back_nothing() {
    let journal = Journal::default();
    let workflow = Workflow::builder("early")
        .compensated_step(Scripted::failing("A", "", &journal))
        .compensated_step(Scripted::ok("B", &journal))
        .build()
        .expect("valid workflow");

    let failure = workflow
        .run()
        .await
        .expect("no storage faults")
        .err()
        .expect("failure");

    assert_eq!(failure.error, TestError::Step(String::new()));
    assert_eq!(failure.steps_completed, 0);
    assert!(journal.rollbacks().is_empty());
}

#[tokio::test]
async fn test_panicking_step_becomes_error() {
    let journal = Journal::default();
    let workflow = Workflow::builder("panics")
        .compensated_step(Scripted::ok("A", &journal))
        .step(Scripted::panicking("B", "kaboom", &journal))
        .build()
        .expect("valid workflow");

    let failure = workflow
        .run()
        .await
        .expect("no storage faults")
        .err()
        .expect("failure");

    assert_eq!(failure.failed_step, "B");
    assert_eq!(failure.error, TestError::Fault("kaboom".to_string()));
    assert_eq!(journal.rollbacks(), vec!["A"]);
}

#[tokio::test]
async fn test_failed_rollback_aborts_compensation() {
    let journal = Journal::default();
    let workflow = Workflow::builder("stuck")
        .compensated_step(Scripted::ok("A", &journal))
        .compensated_step(Scripted::ok("B", &journal).with_undo(Undo::Fail("cannot undo")))
        .step(Scripted::failing("C", "boom", &journal))
        .build()
        .expect("valid workflow");

    let error = workflow.run().await.unwrap_err();

    match error {
        RunError::Rollback {
            step_name,
            failed_step,
            error,
            cause,
        } => {
            assert_eq!(step_name, "B");
            assert_eq!(failed_step, "C");
            assert_eq!(error, TestError::Step("cannot undo".to_string()));
            assert_eq!(cause, TestError::Step("boom".to_string()));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(journal.rollbacks(), vec!["B"]);
}

#[tokio::test]
async fn test_panicking_rollback_aborts_compensation() {
    let journal = Journal::default();
    let workflow = Workflow::builder("stuck")
        .compensated_step(Scripted::ok("A", &journal))
        .compensated_step(Scripted::ok("B", &journal).with_undo(Undo::Panic("undo blew up")))
        .step(Scripted::failing("C", "boom", &journal))
        .build()
        .expect("valid workflow");

    let error = workflow.run().await.unwrap_err();

    match error {
        RunError::Rollback {
            step_name,
            failed_step,
            error,
            cause,
        } => {
            assert_eq!(step_name, "B");
            assert_eq!(failed_step, "C");
            assert_eq!(error, TestError::Fault("undo blew up".to_string()));
            assert_eq!(cause, TestError::Step("boom".to_string()));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(journal.rollbacks(), vec!["B"]);
}

#[tokio::test]
async fn test_empty_workflow_completes() {
    let workflow = Workflow::<TestError>::builder("empty")
        .build()
        .expect("valid workflow");

    let report = workflow
        .run()
        .await
        .expect("no storage faults")
        .ok()
        .expect("success");

    assert_eq!(report.steps_completed, 0);
}

#[derive(Debug)]
struct LoadOrder {
    order_id: ContextToken<String>,
    total: ContextToken<u64>,
}

#[async_trait]
impl Step for LoadOrder {
    type Output = ();
    type Error = TestError;

    async fn run(&self, ctx: &mut Context) -> Outcome<(), TestError> {
        async {
            let id = ctx.get_or_err(&self.order_id)?.clone();
            ctx.set(&self.total, id.len() as u64 * 100);
            Ok::<_, TestError>(())
        }
        .await
        .into()
    }
}

#[derive(Debug)]
struct ApplyDiscount {
    total: ContextToken<u64>,
}

#[async_trait]
impl Step for ApplyDiscount {
    type Output = u64;
    type Error = TestError;

    async fn run(&self, ctx: &mut Context) -> Outcome<u64, TestError> {
        let Some(total) = ctx.get_mut(&self.total) else {
            return Outcome::error(TestError::Step("total missing".to_string()));
        };
        *total -= 50;
        Outcome::success(*total)
    }
}

#[tokio::test]
async fn test_steps_share_context() {
    let order_id = ContextToken::new("order_id");
    let total = ContextToken::new("total");

    let workflow = Workflow::builder("order")
        .setup_context(|ctx| ctx.set(&order_id, "A-1".to_string()))
        .step(LoadOrder { order_id, total })
        .step(ApplyDiscount { total })
        .build()
        .expect("valid workflow");

    let report = workflow
        .run()
        .await
        .expect("no storage faults")
        .ok()
        .expect("success");

    assert_eq!(report.context.get(&total), Some(&250));
    assert_eq!(report.context.get(&order_id).map(String::as_str), Some("A-1"));
}

#[tokio::test]
async fn test_missing_context_entry_fails_step() {
    let order_id = ContextToken::new("order_id");
    let total = ContextToken::new("total");

    let workflow = Workflow::builder("order")
        .step(LoadOrder { order_id, total })
        .build()
        .expect("valid workflow");

    let failure = workflow
        .run()
        .await
        .expect("no storage faults")
        .err()
        .expect("failure");

    assert_eq!(failure.failed_step, "LoadOrder");
    assert!(matches!(failure.error, TestError::Missing(ref msg) if msg.starts_with("order_id#")));
}

#[tokio::test]
async fn test_independent_runs_do_not_share_state() {
    let journal = Journal::default();
    let counter = ContextToken::<u32>::new("counter");

    let build = |seed: u32| {
        Workflow::builder("parallel")
            .setup_context(move |ctx| ctx.set(&counter, seed))
            .step(Scripted::ok("A", &journal))
            .build()
            .expect("valid workflow")
    };

    let first = tokio::spawn(build(1).run());
    let second = tokio::spawn(build(2).run());

    let first = first.await.expect("join").expect("run").ok().expect("success");
    let second = second.await.expect("join").expect("run").ok().expect("success");

    assert_eq!(first.context.get(&counter), Some(&1));
    assert_eq!(second.context.get(&counter), Some(&2));
    assert_eq!(journal.runs().len(), 2);
}
