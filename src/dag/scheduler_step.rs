// src/dag/scheduler_step.rs

//! Step-by-step result types for the scheduler.

use crate::dag::task::TaskAssignment;
use crate::types::TaskId;

/// Structured result of a single dispatch scan.
///
/// Useful for tests that want to assert on side effects of a scan besides
/// the task handed out.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// The task handed to the caller, if any was ready.
    pub dispatched: Option<TaskAssignment>,
    /// Tasks found permanently blocked by a failed dependency during the
    /// scan; they were removed from the queue and marked failed.
    pub newly_failed: Vec<TaskId>,
    /// Tasks whose lease had expired and were put back in the queue before
    /// the scan.
    pub requeued: Vec<TaskId>,
}

/// Outcome of a lease sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaseSweep {
    /// Expired tasks put back in the pending queue.
    pub requeued: Vec<TaskId>,
    /// Expired tasks of finished expressions, marked failed instead.
    pub dropped: Vec<TaskId>,
}
