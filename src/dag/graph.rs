// src/dag/graph.rs

//! Per-expression dependency graph over task ids, backed by petgraph.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::task::Task;
use crate::errors::{CalcError, Result};
use crate::types::{ExpressionId, TaskId};

/// Dependency graph of one expression's tasks.
///
/// Edge direction: producer -> consumer. For `2 + 3 * 4` compiled into
/// `t1 = 3 * 4` and `t2 = 2 + t1` we add the edge `t1 -> t2`.
///
/// The root is fixed when the graph is built and never inferred later.
#[derive(Debug, Clone)]
pub struct ExpressionGraph {
    expression_id: ExpressionId,
    root_task_id: TaskId,
    /// Task ids in emission order.
    order: Vec<TaskId>,
    edges: DiGraphMap<TaskId, ()>,
}

impl ExpressionGraph {
    /// Build the graph from tasks given in emission order.
    pub fn from_tasks(expression_id: ExpressionId, tasks: &[Task], root_task_id: TaskId) -> Self {
        let mut edges: DiGraphMap<TaskId, ()> = DiGraphMap::new();
        let mut order = Vec::with_capacity(tasks.len());

        for task in tasks {
            edges.add_node(task.id);
            order.push(task.id);
        }

        for task in tasks {
            for dep in task.dependencies() {
                edges.add_edge(dep, task.id, ());
            }
        }

        Self {
            expression_id,
            root_task_id,
            order,
            edges,
        }
    }

    pub fn expression_id(&self) -> ExpressionId {
        self.expression_id
    }

    pub fn root_task_id(&self) -> TaskId {
        self.root_task_id
    }

    /// Task ids in emission order.
    pub fn tasks(&self) -> &[TaskId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, task: TaskId) -> bool {
        self.edges.contains_node(task)
    }

    /// Tasks whose outputs `task` consumes.
    pub fn dependencies_of(&self, task: TaskId) -> Vec<TaskId> {
        if !self.contains(task) {
            return Vec::new();
        }
        self.edges
            .neighbors_directed(task, Direction::Incoming)
            .collect()
    }

    /// Tasks that consume the output of `task`.
    pub fn dependents_of(&self, task: TaskId) -> Vec<TaskId> {
        if !self.contains(task) {
            return Vec::new();
        }
        self.edges
            .neighbors_directed(task, Direction::Outgoing)
            .collect()
    }

    /// All tasks downstream of `task`, excluding `task` itself.
    pub fn transitive_dependents(&self, task: TaskId) -> Vec<TaskId> {
        let mut stack = self.dependents_of(task);
        let mut visited: HashSet<TaskId> = HashSet::new();
        let mut out = Vec::new();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            out.push(id);
            stack.extend(self.dependents_of(id));
        }

        out
    }

    /// Check the structural invariants the builder is supposed to uphold:
    /// acyclicity, references only to strictly earlier tasks, and the root
    /// being the last emitted task.
    pub fn validate(&self) -> Result<()> {
        if let Err(cycle) = toposort(&self.edges, None) {
            return Err(CalcError::Internal(anyhow::anyhow!(
                "cycle detected in task graph of expression {} involving task {}",
                self.expression_id,
                cycle.node_id()
            )));
        }

        let position: HashMap<TaskId, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();

        for (from, to, _) in self.edges.all_edges() {
            match (position.get(&from), position.get(&to)) {
                (Some(a), Some(b)) if a < b => {}
                _ => {
                    return Err(CalcError::Internal(anyhow::anyhow!(
                        "task {to} of expression {} references task {from} which is not emitted before it",
                        self.expression_id
                    )));
                }
            }
        }

        if self.order.last() != Some(&self.root_task_id) {
            return Err(CalcError::Internal(anyhow::anyhow!(
                "root task {} of expression {} is not the last emitted task",
                self.root_task_id,
                self.expression_id
            )));
        }

        Ok(())
    }
}
