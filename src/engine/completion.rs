// src/engine/completion.rs

//! Expression status derivation after a result write.

use tracing::{info, warn};

use crate::dag::results::{ResultKey, ResultState};
use crate::engine::state::EngineState;
use crate::storage::Storage;
use crate::types::{ExpressionId, ExpressionStatus};

/// Recompute the status of `expression_id` from its task results.
///
/// - terminal expressions are left alone;
/// - a root value completes the expression and writes the root slot;
/// - all tasks completed without a root value is an anomaly and fails it;
/// - anything else is `Processing`.
///
/// Returns the new status if it changed. Persisting the change is best
/// effort: a storage failure is logged and the in-memory state still moves.
pub fn check_completion(
    state: &mut EngineState,
    storage: &dyn Storage,
    expression_id: ExpressionId,
) -> Option<ExpressionStatus> {
    if !state.is_live(expression_id) {
        return None;
    }

    let EngineState {
        expressions,
        scheduler,
        results,
        ..
    } = state;

    let entry = expressions.get_mut(&expression_id)?;
    let graph = entry.graph.as_ref()?;

    let root = graph.root_task_id();
    let root_value = results.value_of(&ResultKey::task(expression_id, root));

    let expression = &mut entry.expression;
    match root_value {
        Some(value) => {
            expression.status = ExpressionStatus::Completed;
            expression.result = Some(value);

            let root_key = ResultKey::root(expression_id);
            results.settle(root_key, ResultState::Value(value));
            if let Err(err) = storage.save_result(&root_key, &ResultState::Value(value)) {
                warn!(expression = expression_id, error = %err, "failed to persist root result");
            }

            info!(expression = expression_id, result = value, "expression completed");
        }
        None => {
            let total = graph.len();
            let completed = scheduler.tasks_of(graph).filter(|t| t.is_completed()).count();

            if total > 0 && completed == total {
                warn!(
                    expression = expression_id,
                    root,
                    "all tasks completed but the root has no value"
                );
                expression.status = ExpressionStatus::Failed;
                expression.failure = Some(format!("root task {root} produced no result"));
            } else if expression.status == ExpressionStatus::Processing {
                return None;
            } else {
                expression.status = ExpressionStatus::Processing;
            }
        }
    }

    if let Err(err) = storage.update_expression(expression) {
        warn!(
            expression = expression_id,
            status = %expression.status,
            error = %err,
            "failed to persist expression status"
        );
    }

    Some(expression.status)
}
