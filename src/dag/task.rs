// src/dag/task.rs

//! Task records and the dispatch view handed to workers.

use std::time::Instant;

use crate::types::{ExpressionId, Operator, TaskId};

/// Operand of a task.
///
/// Tasks are stored with `Literal` or `PendingRef` operands; `ResolvedRef`
/// only appears on the transient view built while checking readiness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Literal(f64),
    /// Waits on the output of another task of the same expression.
    PendingRef(TaskId),
    /// A reference whose producer has completed with this value.
    ResolvedRef(TaskId, f64),
}

impl Operand {
    /// Concrete value, if the operand is usable as-is.
    pub fn value(&self) -> Option<f64> {
        match *self {
            Operand::Literal(v) | Operand::ResolvedRef(_, v) => Some(v),
            Operand::PendingRef(_) => None,
        }
    }

    /// Task this operand depends on, if any.
    pub fn dependency(&self) -> Option<TaskId> {
        match *self {
            Operand::Literal(_) => None,
            Operand::PendingRef(id) | Operand::ResolvedRef(id, _) => Some(id),
        }
    }
}

/// Lifecycle state of a task inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Sitting in the pending queue.
    Pending,
    /// Handed to a worker. `deadline` is `None` when leases are disabled.
    Dispatched { deadline: Option<Instant> },
    /// A result was reported.
    Completed,
    /// The task errored, or one of its dependencies did.
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub expression_id: ExpressionId,
    pub operator: Operator,
    pub arg1: Operand,
    pub arg2: Operand,
    pub state: TaskState,
    /// Number of times this task was handed to a worker.
    pub attempts: u32,
}

impl Task {
    pub fn new(
        id: TaskId,
        expression_id: ExpressionId,
        operator: Operator,
        arg1: Operand,
        arg2: Operand,
    ) -> Self {
        Self {
            id,
            expression_id,
            operator,
            arg1,
            arg2,
            state: TaskState::Pending,
            attempts: 0,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state == TaskState::Completed
    }

    /// Tasks whose outputs this task consumes.
    pub fn dependencies(&self) -> impl Iterator<Item = TaskId> + '_ {
        [self.arg1, self.arg2].into_iter().filter_map(|op| op.dependency())
    }
}

/// Description of a ready task handed to a worker.
///
/// Operands are always concrete numbers; references never leave the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskAssignment {
    pub id: TaskId,
    pub expression_id: ExpressionId,
    pub operator: Operator,
    pub arg1: f64,
    pub arg2: f64,
    /// Simulated cost of the operation, looked up by operator at dispatch.
    pub duration_ms: u64,
}
