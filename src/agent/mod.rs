// src/agent/mod.rs

//! In-process worker pool ("agent").
//!
//! Each worker polls a [`TaskSource`], evaluates the operation it receives
//! and reports the outcome. Workers are plain Tokio tasks that stop when the
//! shared shutdown signal flips to `true`.

pub mod evaluate;
pub mod source;
pub mod worker;

pub use evaluate::evaluate;
pub use source::TaskSource;
pub use worker::{WorkerOptions, WorkerStats, run_worker};

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to a running pool.
#[derive(Debug)]
pub struct WorkerPool {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<WorkerStats>>,
}

impl WorkerPool {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Signal shutdown and wait for every worker; returns the summed stats.
    pub async fn shutdown(self) -> WorkerStats {
        let _ = self.shutdown.send(true);

        let mut total = WorkerStats::default();
        for handle in self.handles {
            match handle.await {
                Ok(stats) => {
                    total.completed += stats.completed;
                    total.failed += stats.failed;
                }
                Err(err) => tracing::warn!(error = %err, "worker task panicked or was cancelled"),
            }
        }
        total
    }
}

/// Spawn `count` workers sharing `source`.
pub fn spawn_workers<S>(source: S, count: usize, options: WorkerOptions) -> WorkerPool
where
    S: TaskSource + Clone + 'static,
{
    let (shutdown, rx) = watch::channel(false);

    let handles = (0..count)
        .map(|worker_id| {
            let source = source.clone();
            let rx = rx.clone();
            tokio::spawn(run_worker(worker_id, source, options, rx))
        })
        .collect();

    WorkerPool { shutdown, handles }
}
