// src/dag/mod.rs

//! Task graph representation and scheduling.
//!
//! - [`task`] holds task records, operands and the dispatch view.
//! - [`builder`] turns compiled operations into tasks with an explicit root.
//! - [`graph`] keeps per-expression dependency edges.
//! - [`results`] is the tri-state result store.
//! - [`scheduler`] owns the task table and the pending queue.
//! - [`state_manager`] implements readiness checks and state transitions.
//! - [`scheduler_step`] defines the result types of a dispatch scan and a
//!   lease sweep.

pub mod builder;
pub mod graph;
pub mod results;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task;

pub use builder::{BuiltGraph, TaskGraphBuilder};
pub use graph::ExpressionGraph;
pub use results::{ResultKey, ResultState, ResultStore};
pub use scheduler::Scheduler;
pub use scheduler_step::{LeaseSweep, SchedulerStep};
pub use state_manager::Readiness;
pub use task::{Operand, Task, TaskAssignment, TaskState};
