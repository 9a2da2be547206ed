// src/agent/source.rs

//! Where workers get tasks from and report outcomes to.
//!
//! Workers talk to a `TaskSource` instead of the engine directly, so a
//! transport client can stand in for the in-process [`Engine`] without
//! touching the worker loop.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::dag::task::TaskAssignment;
use crate::engine::Engine;
use crate::errors::{CalcError, Result};
use crate::types::TaskId;

pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

pub trait TaskSource: Send + Sync {
    /// Next ready task, or `Ok(None)` when nothing is dispatchable right now.
    fn next_task(&self) -> SourceFuture<'_, Option<TaskAssignment>>;

    fn report_result(&self, task: TaskId, value: f64) -> SourceFuture<'_, ()>;

    fn report_error(&self, task: TaskId, message: String) -> SourceFuture<'_, ()>;
}

impl TaskSource for Engine {
    fn next_task(&self) -> SourceFuture<'_, Option<TaskAssignment>> {
        Box::pin(async move {
            match self.get_next_task() {
                Ok(task) => Ok(Some(task)),
                Err(CalcError::NoTaskAvailable) => Ok(None),
                Err(err) => Err(err),
            }
        })
    }

    fn report_result(&self, task: TaskId, value: f64) -> SourceFuture<'_, ()> {
        Box::pin(async move { self.set_task_result(task, value) })
    }

    fn report_error(&self, task: TaskId, message: String) -> SourceFuture<'_, ()> {
        Box::pin(async move { self.set_task_error(task, &message) })
    }
}

impl<T: TaskSource + ?Sized> TaskSource for Arc<T> {
    fn next_task(&self) -> SourceFuture<'_, Option<TaskAssignment>> {
        (**self).next_task()
    }

    fn report_result(&self, task: TaskId, value: f64) -> SourceFuture<'_, ()> {
        (**self).report_result(task, value)
    }

    fn report_error(&self, task: TaskId, message: String) -> SourceFuture<'_, ()> {
        (**self).report_error(task, message)
    }
}
