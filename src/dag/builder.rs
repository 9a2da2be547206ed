// src/dag/builder.rs

//! Turn compiled operations into globally identified tasks.

use anyhow::anyhow;
use tracing::debug;

use crate::compiler::{CompiledExpression, OperandRef};
use crate::dag::graph::ExpressionGraph;
use crate::dag::task::{Operand, Task};
use crate::errors::{CalcError, Result};
use crate::types::{ExpressionId, TaskId};

/// Tasks of one expression, staged but not yet visible to the scheduler.
#[derive(Debug, Clone)]
pub struct BuiltGraph {
    pub graph: ExpressionGraph,
    /// Tasks in emission order; the last one is the root.
    pub tasks: Vec<Task>,
}

impl BuiltGraph {
    pub fn root_task_id(&self) -> TaskId {
        self.graph.root_task_id()
    }
}

/// Allocates task ids and rewrites operation references into task
/// references.
///
/// Operations must be processed in emission order: operation `k` can only
/// refer to operations that already received a task id.
pub struct TaskGraphBuilder<'a> {
    expression_id: ExpressionId,
    next_task_id: &'a mut TaskId,
}

impl<'a> TaskGraphBuilder<'a> {
    /// `next_task_id` is the engine-wide id counter; it is only advanced if
    /// the build succeeds.
    pub fn new(expression_id: ExpressionId, next_task_id: &'a mut TaskId) -> Self {
        Self {
            expression_id,
            next_task_id,
        }
    }

    pub fn build(self, compiled: &CompiledExpression) -> Result<BuiltGraph> {
        if compiled.operations.is_empty() {
            return Err(CalcError::Internal(anyhow!(
                "expression {} has no operations to build tasks from",
                self.expression_id
            )));
        }

        let mut next_id = *self.next_task_id;
        // op_to_task[k - 1] is the task id of operation k.
        let mut op_to_task: Vec<TaskId> = Vec::with_capacity(compiled.operations.len());
        let mut tasks = Vec::with_capacity(compiled.operations.len());

        for (index, op) in compiled.operations.iter().enumerate() {
            let task_id = next_id;
            next_id += 1;

            let arg1 = self.translate(op.left, &op_to_task, index + 1)?;
            let arg2 = self.translate(op.right, &op_to_task, index + 1)?;

            debug!(
                expression = self.expression_id,
                task = task_id,
                operator = %op.operator,
                ?arg1,
                ?arg2,
                "built task"
            );

            tasks.push(Task::new(task_id, self.expression_id, op.operator, arg1, arg2));
            op_to_task.push(task_id);
        }

        let root_task_id = *op_to_task
            .last()
            .ok_or_else(|| anyhow!("no tasks were built"))?;

        if compiled.output != OperandRef::Output(compiled.operations.len()) {
            return Err(CalcError::Internal(anyhow!(
                "expression {} output {:?} is not the last operation",
                self.expression_id,
                compiled.output
            )));
        }

        let graph = ExpressionGraph::from_tasks(self.expression_id, &tasks, root_task_id);
        graph.validate()?;

        *self.next_task_id = next_id;

        Ok(BuiltGraph { graph, tasks })
    }

    fn translate(&self, operand: OperandRef, op_to_task: &[TaskId], current: usize) -> Result<Operand> {
        match operand {
            OperandRef::Literal(value) => Ok(Operand::Literal(value)),
            OperandRef::Output(k) if k >= 1 && k < current => Ok(Operand::PendingRef(op_to_task[k - 1])),
            OperandRef::Output(k) => Err(CalcError::Internal(anyhow!(
                "operation {current} of expression {} references operation {k}, which is not emitted before it",
                self.expression_id
            ))),
        }
    }
}
