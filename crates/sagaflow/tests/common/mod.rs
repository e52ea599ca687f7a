#![allow(dead_code)]

use async_trait::async_trait;
use sagaflow::prelude::*;
use sagaflow::ContextError;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestError {
    Step(String),
    Fault(String),
    Missing(String),
}

impl From<StepFault> for TestError {
    fn from(fault: StepFault) -> Self {
        TestError::Fault(fault.message().to_string())
    }
}

impl From<ContextError> for TestError {
    fn from(error: ContextError) -> Self {
        TestError::Missing(error.to_string())
    }
}

/// Everything observable during a run, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Run(&'static str),
    Rollback(&'static str),
    StoreWorkflow(String),
    UpdateWorkflow(String, WorkflowStatus),
    StoreStep(String, String),
    UpdateStep(String, String, WorkflowStatus),
}

#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Event>>>);

impl Journal {
    pub fn record(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn rollbacks(&self) -> Vec<&'static str> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Rollback(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn runs(&self) -> Vec<&'static str> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Run(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    pub fn count(&self, matcher: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| matcher(e)).count()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Action {
    Succeed,
    Fail(&'static str),
    Panic(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub enum Undo {
    Succeed,
    Fail(&'static str),
    Panic(&'static str),
}

/// A step whose behavior is fixed up front and which logs to a journal.
#[derive(Debug)]
pub struct Scripted {
    pub name: &'static str,
    pub action: Action,
    pub undo: Undo,
    pub journal: Journal,
}

impl Scripted {
    pub fn ok(name: &'static str, journal: &Journal) -> Self {
        Self::new(name, Action::Succeed, journal)
    }

    pub fn failing(name: &'static str, message: &'static str, journal: &Journal) -> Self {
        Self::new(name, Action::Fail(message), journal)
    }

    pub fn panicking(name: &'static str, message: &'static str, journal: &Journal) -> Self {
        Self::new(name, Action::Panic(message), journal)
    }

    pub fn new(name: &'static str, action: Action, journal: &Journal) -> Self {
        Self {
            name,
            action,
            undo: Undo::Succeed,
            journal: journal.clone(),
        }
    }

    pub fn with_undo(mut self, undo: Undo) -> Self {
        self.undo = undo;
        self
    }
}

#[async_trait]
impl Step for Scripted {
    type Output = &'static str;
    type Error = TestError;

    async fn run(&self, _ctx: &mut Context) -> Outcome<&'static str, TestError> {
        self.journal.record(Event::Run(self.name));
        match self.action {
            Action::Succeed => Outcome::success(self.name),
            Action::Fail(message) => Outcome::error(TestError::Step(message.to_string())),
            Action::Panic(message) => panic!("{}", message),
        }
    }

    fn name(&self) -> StepName {
        StepName::new(self.name)
    }
}

#[async_trait]
impl Rollback for Scripted {
    async fn rollback(&self, _ctx: &mut Context) -> Result<(), TestError> {
        self.journal.record(Event::Rollback(self.name));
        match self.undo {
            Undo::Succeed => Ok(()),
            Undo::Fail(message) => Err(TestError::Step(message.to_string())),
            Undo::Panic(message) => panic!("{}", message),
        }
    }
}

/// Storage strategy that journals every call and hands out string ids.
#[derive(Debug)]
pub struct RecordingStorage {
    journal: Journal,
    next_id: AtomicUsize,
    fail_on: Option<&'static str>,
}

impl RecordingStorage {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            next_id: AtomicUsize::new(1),
            fail_on: None,
        }
    }

    /// Makes the named method return an error.
    pub fn failing_on(mut self, method: &'static str) -> Self {
        self.fail_on = Some(method);
        self
    }

    fn check(&self, method: &'static str) -> Result<(), io::Error> {
        if self.fail_on == Some(method) {
            return Err(io::Error::new(io::ErrorKind::Other, format!("{} unavailable", method)));
        }
        Ok(())
    }

    fn next(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

#[async_trait]
impl StorageStrategy for RecordingStorage {
    type Id = String;
    type Error = io::Error;

    async fn store_workflow(&self, name: &str) -> Result<String, io::Error> {
        self.check("store_workflow")?;
        self.journal.record(Event::StoreWorkflow(name.to_string()));
        Ok(self.next("wf"))
    }

    async fn update_workflow_status(
        &self,
        workflow_id: &String,
        status: WorkflowStatus,
    ) -> Result<(), io::Error> {
        self.check("update_workflow_status")?;
        self.journal
            .record(Event::UpdateWorkflow(workflow_id.clone(), status));
        Ok(())
    }

    async fn store_step(
        &self,
        workflow_id: &String,
        step_name: &StepName,
    ) -> Result<String, io::Error> {
        self.check("store_step")?;
        self.journal
            .record(Event::StoreStep(workflow_id.clone(), step_name.to_string()));
        Ok(self.next("step"))
    }

    async fn update_step_status(
        &self,
        workflow_id: &String,
        step_id: &String,
        status: WorkflowStatus,
    ) -> Result<(), io::Error> {
        self.check("update_step_status")?;
        self.journal.record(Event::UpdateStep(
            workflow_id.clone(),
            step_id.clone(),
            status,
        ));
        Ok(())
    }
}
