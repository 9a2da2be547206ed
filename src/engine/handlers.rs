// src/engine/handlers.rs

//! Engine operations as plain functions over [`EngineState`].
//!
//! Each handler runs with the engine lock held and performs no locking of
//! its own, which keeps the logic testable without an [`Engine`].
//!
//! [`Engine`]: crate::engine::Engine

use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::compiler::CompiledExpression;
use crate::config::model::OperationDurations;
use crate::dag::results::{ResultKey, ResultState};
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::task::TaskState;
use crate::engine::completion::check_completion;
use crate::engine::state::{EngineState, ExpressionEntry};
use crate::errors::{CalcError, Result};
use crate::storage::Storage;
use crate::types::{Expression, ExpressionId, ExpressionStatus, OwnerId, TaskId};

/// Register an already-compiled expression.
///
/// Pure literals complete immediately. Everything else is built into a task
/// graph, persisted, and only then made visible to the scheduler.
pub fn handle_submission(
    state: &mut EngineState,
    storage: &dyn Storage,
    owner: OwnerId,
    text: &str,
    compiled: &CompiledExpression,
) -> Result<ExpressionId> {
    if let Some(value) = compiled.literal_value() {
        return handle_literal(state, storage, owner, text, value);
    }

    let id = state.peek_expression_id();
    let built = state.scheduler.builder_for(id).build(compiled)?;

    let mut expression = Expression::new(id, owner, text);
    expression.root_task_id = Some(built.root_task_id());

    if let Err(err) = persist_submission(storage, &expression, &built.tasks) {
        discard_partial(state, storage, id);
        return Err(CalcError::Internal(err));
    }

    for task in &built.tasks {
        state.results.open(ResultKey::task(id, task.id));
    }
    state.results.open(ResultKey::root(id));

    let task_count = built.tasks.len();
    let root = built.root_task_id();
    state.scheduler.register(built.tasks);
    state.insert_expression(ExpressionEntry {
        expression,
        graph: Some(built.graph),
    });

    info!(expression = id, owner, tasks = task_count, root, "expression accepted");
    Ok(id)
}

/// Register an expression that is a single number.
pub fn handle_literal(
    state: &mut EngineState,
    storage: &dyn Storage,
    owner: OwnerId,
    text: &str,
    value: f64,
) -> Result<ExpressionId> {
    let id = state.peek_expression_id();
    let mut expression = Expression::new(id, owner, text);
    expression.status = ExpressionStatus::Completed;
    expression.result = Some(value);

    let root_key = ResultKey::root(id);
    let persisted = storage
        .save_expression(&expression)
        .and_then(|()| storage.save_result(&root_key, &ResultState::Value(value)));
    if let Err(err) = persisted {
        discard_partial(state, storage, id);
        return Err(CalcError::Internal(
            err.context(format!("failed to store literal expression {id}")),
        ));
    }

    state.results.settle(root_key, ResultState::Value(value));
    state.insert_expression(ExpressionEntry {
        expression,
        graph: None,
    });

    info!(expression = id, owner, result = value, "literal expression completed");
    Ok(id)
}

/// Remove whatever a failed submission left in storage. If that fails too,
/// the id is retired so the leftover rows can never collide with a later
/// submission.
fn discard_partial(state: &mut EngineState, storage: &dyn Storage, id: ExpressionId) {
    if let Err(err) = storage.discard_expression(id) {
        warn!(expression = id, error = %err, "failed to discard partially stored expression; retiring id");
        state.abandon_expression_id(id);
    }
}

fn persist_submission(
    storage: &dyn Storage,
    expression: &Expression,
    tasks: &[crate::dag::task::Task],
) -> anyhow::Result<()> {
    storage
        .save_expression(expression)
        .with_context(|| format!("failed to store expression {}", expression.id))?;
    for task in tasks {
        storage.save_task(task).with_context(|| {
            format!("failed to store task {} of expression {}", task.id, expression.id)
        })?;
    }
    Ok(())
}

/// Requeue expired leases, then hand out the first ready task.
pub fn handle_dispatch(
    state: &mut EngineState,
    durations: &OperationDurations,
    lease: Option<Duration>,
    now: Instant,
) -> SchedulerStep {
    let requeued = handle_lease_sweep(state, now);

    let mut step = state
        .scheduler
        .dispatch_next(&state.results, durations, lease, now);
    step.requeued = requeued;

    for id in &step.newly_failed {
        if let Some(task) = state.scheduler.task(*id) {
            state.results.settle(
                ResultKey::task(task.expression_id, *id),
                ResultState::Failed("dependency failed".to_string()),
            );
        }
    }

    step
}

/// Put tasks with expired leases back in the pending queue.
///
/// Expired tasks of finished expressions are failed and their result slots
/// settled, so a report arriving afterwards is ignored.
pub fn handle_lease_sweep(state: &mut EngineState, now: Instant) -> Vec<TaskId> {
    let EngineState {
        expressions,
        scheduler,
        ..
    } = &mut *state;
    let sweep = scheduler.requeue_expired(now, |expression| {
        expressions.get(&expression).is_some_and(ExpressionEntry::is_live)
    });

    for id in sweep.dropped {
        if let Some(task) = state.scheduler.task(id) {
            state.results.settle(
                ResultKey::task(task.expression_id, id),
                ResultState::Failed("lease expired after expression finished".to_string()),
            );
        }
    }

    sweep.requeued
}

/// Record a successful task result and re-derive the expression status.
pub fn handle_task_result(
    state: &mut EngineState,
    storage: &dyn Storage,
    task_id: TaskId,
    value: f64,
) -> Result<()> {
    let task = state
        .scheduler
        .task(task_id)
        .ok_or(CalcError::TaskNotFound(task_id))?;
    let expression_id = task.expression_id;

    match task.state {
        TaskState::Completed => {
            debug!(task = task_id, expression = expression_id, "duplicate result ignored");
            return Ok(());
        }
        TaskState::Failed => {
            warn!(task = task_id, expression = expression_id, "result for a failed task ignored");
            return Ok(());
        }
        TaskState::Pending | TaskState::Dispatched { .. } => {}
    }

    let key = ResultKey::task(expression_id, task_id);
    storage
        .save_result(&key, &ResultState::Value(value))
        .with_context(|| format!("failed to store result {key}"))?;

    state.results.settle(key, ResultState::Value(value));
    state.scheduler.mark_completed(task_id);

    info!(task = task_id, expression = expression_id, result = value, "task result recorded");

    check_completion(state, storage, expression_id);
    Ok(())
}

/// Record a task failure, fail everything downstream of it and the owning
/// expression.
pub fn handle_task_error(
    state: &mut EngineState,
    storage: &dyn Storage,
    task_id: TaskId,
    message: &str,
) -> Result<()> {
    let task = state
        .scheduler
        .task(task_id)
        .ok_or(CalcError::TaskNotFound(task_id))?;
    let expression_id = task.expression_id;

    match task.state {
        TaskState::Completed => {
            warn!(
                task = task_id,
                expression = expression_id,
                "error reported for a completed task; ignoring"
            );
            return Ok(());
        }
        TaskState::Failed => {
            debug!(task = task_id, expression = expression_id, "duplicate error ignored");
            return Ok(());
        }
        TaskState::Pending | TaskState::Dispatched { .. } => {}
    }

    let key = ResultKey::task(expression_id, task_id);
    let failed = ResultState::Failed(message.to_string());
    state.results.settle(key, failed.clone());
    if let Err(err) = storage.save_result(&key, &failed) {
        warn!(task = task_id, error = %err, "failed to persist task failure");
    }

    let EngineState {
        expressions,
        scheduler,
        results,
        ..
    } = state;

    let Some(entry) = expressions.get_mut(&expression_id) else {
        warn!(task = task_id, expression = expression_id, "task belongs to an unknown expression");
        return Ok(());
    };

    let dependents = match entry.graph.as_ref() {
        Some(graph) => scheduler.fail_with_dependents(graph, task_id),
        None => Vec::new(),
    };
    for dependent in &dependents {
        results.settle(
            ResultKey::task(expression_id, *dependent),
            ResultState::Failed(format!("dependency {task_id} failed")),
        );
    }

    warn!(
        task = task_id,
        expression = expression_id,
        dependents = dependents.len(),
        error = message,
        "task failed"
    );

    let expression = &mut entry.expression;
    if expression.is_terminal() {
        return Ok(());
    }

    expression.status = ExpressionStatus::Failed;
    expression.failure = Some(message.to_string());
    if let Err(err) = storage.update_expression(expression) {
        warn!(expression = expression_id, error = %err, "failed to persist expression failure");
    }

    info!(expression = expression_id, reason = message, "expression failed");
    Ok(())
}
