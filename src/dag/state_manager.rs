// src/dag/state_manager.rs

//! Task state transitions and readiness checks used by the scheduler.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, warn};

use crate::dag::graph::ExpressionGraph;
use crate::dag::results::{ResultKey, ResultState, ResultStore};
use crate::dag::task::{Operand, Task, TaskState};
use crate::types::TaskId;

/// Outcome of checking one task against the result store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Readiness {
    /// Both operands are concrete; the operands carry the resolved values.
    Ready { arg1: Operand, arg2: Operand },
    /// At least one producer has not reported yet.
    Waiting,
    /// A producer failed; this task can never run.
    Blocked { failed_dependency: TaskId },
}

enum Resolution {
    Resolved(Operand),
    Waiting,
    Blocked(TaskId),
}

/// Read-only view used to decide whether a task can be dispatched.
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a HashMap<TaskId, Task>,
    results: &'a ResultStore,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a HashMap<TaskId, Task>, results: &'a ResultStore) -> Self {
        Self { tasks, results }
    }

    pub fn readiness(&self, task: &Task) -> Readiness {
        let arg1 = self.resolve(task, task.arg1);
        let arg2 = self.resolve(task, task.arg2);

        match (arg1, arg2) {
            (Resolution::Blocked(id), _) | (_, Resolution::Blocked(id)) => Readiness::Blocked {
                failed_dependency: id,
            },
            (Resolution::Resolved(arg1), Resolution::Resolved(arg2)) => {
                Readiness::Ready { arg1, arg2 }
            }
            _ => Readiness::Waiting,
        }
    }

    fn resolve(&self, task: &Task, operand: Operand) -> Resolution {
        let producer = match operand {
            Operand::Literal(_) | Operand::ResolvedRef(..) => return Resolution::Resolved(operand),
            Operand::PendingRef(producer) => producer,
        };

        match self.results.get(&ResultKey::task(task.expression_id, producer)) {
            Some(ResultState::Value(value)) => {
                return Resolution::Resolved(Operand::ResolvedRef(producer, *value));
            }
            Some(ResultState::Failed(_)) => return Resolution::Blocked(producer),
            Some(ResultState::Pending) | None => {}
        }

        match self.tasks.get(&producer).map(|t| t.state) {
            Some(TaskState::Failed) => Resolution::Blocked(producer),
            Some(_) => Resolution::Waiting,
            None => {
                warn!(
                    task = task.id,
                    producer,
                    "operand references a task missing from the task table"
                );
                Resolution::Blocked(producer)
            }
        }
    }
}

/// Mutable view over the task table and pending queue.
pub struct StateManager<'a> {
    tasks: &'a mut HashMap<TaskId, Task>,
    pending: &'a mut VecDeque<TaskId>,
}

impl<'a> StateManager<'a> {
    pub fn new(tasks: &'a mut HashMap<TaskId, Task>, pending: &'a mut VecDeque<TaskId>) -> Self {
        Self { tasks, pending }
    }

    /// Mark a task `Failed` and drop it from the pending queue.
    ///
    /// Returns `false` if the task is unknown or already terminal.
    pub fn mark_failed(&mut self, id: TaskId) -> bool {
        let Some(task) = self.tasks.get_mut(&id) else {
            return false;
        };
        if task.state.is_terminal() {
            return false;
        }
        task.state = TaskState::Failed;
        self.pending.retain(|queued| *queued != id);
        true
    }

    /// Mark every downstream task of `failed` as `Failed`.
    ///
    /// Returns the tasks that were newly failed (excluding `failed` itself).
    pub fn mark_dependents_failed(&mut self, graph: &ExpressionGraph, failed: TaskId) -> Vec<TaskId> {
        let mut newly_failed = Vec::new();

        for id in graph.transitive_dependents(failed) {
            if self.mark_failed(id) {
                debug!(
                    task = id,
                    upstream = failed,
                    "marking dependent as Failed due to upstream failure"
                );
                newly_failed.push(id);
            }
        }

        newly_failed
    }

    /// Mark a task `Completed` and drop it from the pending queue (it may
    /// have been requeued after its lease expired).
    ///
    /// Returns `false` if the task is unknown or already terminal.
    pub fn mark_completed(&mut self, id: TaskId) -> bool {
        let Some(task) = self.tasks.get_mut(&id) else {
            return false;
        };
        if task.state.is_terminal() {
            return false;
        }
        task.state = TaskState::Completed;
        self.pending.retain(|queued| *queued != id);
        true
    }
}
