// src/dag/scheduler.rs

//! Global task table, pending queue, dispatch and lease expiry.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::model::OperationDurations;
use crate::dag::builder::TaskGraphBuilder;
use crate::dag::graph::ExpressionGraph;
use crate::dag::results::ResultStore;
use crate::dag::scheduler_step::{LeaseSweep, SchedulerStep};
use crate::dag::state_manager::{ReadOnlyStateManager, Readiness, StateManager};
use crate::dag::task::{Task, TaskAssignment, TaskState};
use crate::types::{ExpressionId, TaskId};

/// Scheduler owns the global task table and the pending queue.
///
/// It is responsible for:
/// - allocating task ids for newly built graphs
/// - scanning the pending queue in insertion order for the first ready task
/// - handing ready tasks out exactly once per lease
/// - requeueing tasks whose lease expired without a report
/// - failing tasks whose dependencies failed
#[derive(Debug)]
pub struct Scheduler {
    tasks: HashMap<TaskId, Task>,
    pending: VecDeque<TaskId>,
    next_task_id: TaskId,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            pending: VecDeque::new(),
            next_task_id: 1,
        }
    }

    /// Builder that allocates ids from this scheduler's counter.
    pub fn builder_for(&mut self, expression_id: ExpressionId) -> TaskGraphBuilder<'_> {
        TaskGraphBuilder::new(expression_id, &mut self.next_task_id)
    }

    /// Make already-persisted tasks visible for dispatch, in emission order.
    pub fn register(&mut self, tasks: Vec<Task>) {
        for task in tasks {
            debug!(
                task = task.id,
                expression = task.expression_id,
                operator = %task.operator,
                "task enqueued"
            );
            self.pending.push_back(task.id);
            self.tasks.insert(task.id, task);
        }
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Tasks of one expression, in emission order.
    pub fn tasks_of<'a>(&'a self, graph: &'a ExpressionGraph) -> impl Iterator<Item = &'a Task> + 'a {
        graph.tasks().iter().filter_map(|id| self.tasks.get(id))
    }

    /// Task ids currently waiting in the queue, front first.
    pub fn pending_ids(&self) -> Vec<TaskId> {
        self.pending.iter().copied().collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the task's dependencies are satisfied right now.
    ///
    /// Returns `None` if the task is unknown.
    pub fn readiness_of(&self, id: TaskId, results: &ResultStore) -> Option<Readiness> {
        let task = self.tasks.get(&id)?;
        Some(ReadOnlyStateManager::new(&self.tasks, results).readiness(task))
    }

    /// Requeue dispatched tasks whose lease deadline is at or before `now`.
    ///
    /// Tasks of expressions for which `is_live` returns `false` are failed
    /// instead of requeued, so a late report for them is ignored.
    pub fn requeue_expired(
        &mut self,
        now: Instant,
        is_live: impl Fn(ExpressionId) -> bool,
    ) -> LeaseSweep {
        let mut expired: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|task| {
                matches!(task.state, TaskState::Dispatched { deadline: Some(deadline) } if deadline <= now)
            })
            .map(|task| task.id)
            .collect();
        expired.sort_unstable();

        let mut sweep = LeaseSweep::default();
        for id in expired {
            let Some(task) = self.tasks.get_mut(&id) else {
                continue;
            };

            if is_live(task.expression_id) {
                warn!(
                    task = id,
                    expression = task.expression_id,
                    attempts = task.attempts,
                    "lease expired without a report; requeueing task"
                );
                task.state = TaskState::Pending;
                self.pending.push_back(id);
                sweep.requeued.push(id);
            } else {
                debug!(
                    task = id,
                    expression = task.expression_id,
                    "lease expired for task of a finished expression; dropping"
                );
                task.state = TaskState::Failed;
                sweep.dropped.push(id);
            }
        }

        sweep
    }

    /// Scan the pending queue and hand out the first ready task.
    ///
    /// Unready tasks keep their position. Tasks found blocked by a failed
    /// dependency are removed and reported in
    /// [`SchedulerStep::newly_failed`].
    pub fn dispatch_next(
        &mut self,
        results: &ResultStore,
        durations: &OperationDurations,
        lease: Option<Duration>,
        now: Instant,
    ) -> SchedulerStep {
        let mut step = SchedulerStep::default();
        let mut chosen = None;
        let mut blocked = Vec::new();

        {
            let view = ReadOnlyStateManager::new(&self.tasks, results);
            for id in self.pending.iter() {
                let Some(task) = self.tasks.get(id) else {
                    warn!(task = *id, "queued task missing from task table");
                    continue;
                };
                match view.readiness(task) {
                    Readiness::Ready { arg1, arg2 } => {
                        chosen = Some((*id, arg1, arg2));
                        break;
                    }
                    Readiness::Waiting => {}
                    Readiness::Blocked { failed_dependency } => {
                        debug!(
                            task = *id,
                            failed_dependency,
                            "task blocked by failed dependency"
                        );
                        blocked.push(*id);
                    }
                }
            }
        }

        let mut manager = StateManager::new(&mut self.tasks, &mut self.pending);
        for id in blocked {
            if manager.mark_failed(id) {
                step.newly_failed.push(id);
            }
        }

        let Some((id, arg1, arg2)) = chosen else {
            return step;
        };

        if let Some(position) = self.pending.iter().position(|queued| *queued == id) {
            self.pending.remove(position);
        }

        let Some(task) = self.tasks.get_mut(&id) else {
            return step;
        };

        let (Some(arg1), Some(arg2)) = (arg1.value(), arg2.value()) else {
            warn!(task = id, "ready task has unresolved operands; leaving it queued");
            self.pending.push_front(id);
            return step;
        };

        task.state = TaskState::Dispatched {
            deadline: lease.map(|lease| now + lease),
        };
        task.attempts += 1;

        let assignment = TaskAssignment {
            id,
            expression_id: task.expression_id,
            operator: task.operator,
            arg1,
            arg2,
            duration_ms: durations.duration_for(task.operator),
        };

        info!(
            task = id,
            expression = task.expression_id,
            operator = %task.operator,
            attempt = task.attempts,
            "task assigned"
        );

        step.dispatched = Some(assignment);
        step
    }

    /// See [`StateManager::mark_completed`].
    pub fn mark_completed(&mut self, id: TaskId) -> bool {
        StateManager::new(&mut self.tasks, &mut self.pending).mark_completed(id)
    }

    /// Fail `id` and everything downstream of it in `graph`.
    ///
    /// Returns the dependents that were newly failed (excluding `id`).
    pub fn fail_with_dependents(&mut self, graph: &ExpressionGraph, id: TaskId) -> Vec<TaskId> {
        let mut manager = StateManager::new(&mut self.tasks, &mut self.pending);
        manager.mark_failed(id);
        manager.mark_dependents_failed(graph, id)
    }
}
