// src/agent/worker.rs

//! Worker loop: poll, simulate the operation's cost, evaluate, report.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::agent::evaluate::evaluate;
use crate::agent::source::TaskSource;
use crate::dag::task::TaskAssignment;

#[derive(Debug, Clone, Copy)]
pub struct WorkerOptions {
    /// Delay between polls after an empty or failed poll.
    pub poll_interval: Duration,
    /// Sleep for each task's `duration_ms` before evaluating it.
    pub simulate_duration: bool,
}

/// Counters returned when a worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub completed: u64,
    pub failed: u64,
}

/// Run one worker until `shutdown` turns `true` (or its sender is dropped).
///
/// The shutdown signal is checked between iterations and while sleeping; an
/// in-flight call to the source is never interrupted.
pub async fn run_worker<S>(
    worker_id: usize,
    source: S,
    options: WorkerOptions,
    mut shutdown: watch::Receiver<bool>,
) -> WorkerStats
where
    S: TaskSource,
{
    info!(worker = worker_id, "worker started");
    let mut stats = WorkerStats::default();

    while !*shutdown.borrow() {
        let task = match source.next_task().await {
            Ok(Some(task)) => task,
            Ok(None) => {
                if sleep_or_shutdown(options.poll_interval, &mut shutdown).await {
                    break;
                }
                continue;
            }
            Err(err) => {
                warn!(worker = worker_id, error = %err, "failed to fetch a task");
                if sleep_or_shutdown(options.poll_interval, &mut shutdown).await {
                    break;
                }
                continue;
            }
        };

        if options.simulate_duration
            && task.duration_ms > 0
            && sleep_or_shutdown(Duration::from_millis(task.duration_ms), &mut shutdown).await
        {
            debug!(worker = worker_id, task = task.id, "shutdown while simulating; task left to its lease");
            break;
        }

        execute(worker_id, &source, &task, &mut stats).await;
    }

    info!(
        worker = worker_id,
        completed = stats.completed,
        failed = stats.failed,
        "worker stopped"
    );
    stats
}

async fn execute<S: TaskSource>(
    worker_id: usize,
    source: &S,
    task: &TaskAssignment,
    stats: &mut WorkerStats,
) {
    match evaluate(task.operator, task.arg1, task.arg2) {
        Ok(value) => {
            debug!(
                worker = worker_id,
                task = task.id,
                expression = task.expression_id,
                operator = %task.operator,
                value,
                "task evaluated"
            );
            match source.report_result(task.id, value).await {
                Ok(()) => stats.completed += 1,
                Err(err) => warn!(worker = worker_id, task = task.id, error = %err, "failed to report result"),
            }
        }
        Err(err) => {
            warn!(
                worker = worker_id,
                task = task.id,
                expression = task.expression_id,
                error = %err,
                "task evaluation failed"
            );
            match source.report_error(task.id, err.to_string()).await {
                Ok(()) => stats.failed += 1,
                Err(report_err) => warn!(
                    worker = worker_id,
                    task = task.id,
                    error = %report_err,
                    "failed to report task error"
                ),
            }
        }
    }
}

/// Sleep for `duration`; returns `true` if shutdown was requested meanwhile.
async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => *shutdown.borrow(),
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}
