// src/storage/mod.rs

use std::fmt::Debug;

use anyhow::Result;

use crate::dag::results::{ResultKey, ResultState};
use crate::dag::task::Task;
use crate::types::{Expression, ExpressionId};

pub mod memory;

pub use memory::MemoryStorage;

/// Persistence collaborator of the engine.
///
/// The engine calls these methods while holding its own lock, so
/// implementations must not call back into the engine.
pub trait Storage: Send + Sync + Debug {
    /// Persist a newly accepted expression.
    fn save_expression(&self, expression: &Expression) -> Result<()>;

    /// Persist a status or result change of an existing expression.
    fn update_expression(&self, expression: &Expression) -> Result<()>;

    fn load_expression(&self, id: ExpressionId) -> Result<Option<Expression>>;

    /// All stored expressions, ordered by id.
    fn list_expressions(&self) -> Result<Vec<Expression>>;

    fn save_task(&self, task: &Task) -> Result<()>;

    fn save_result(&self, key: &ResultKey, state: &ResultState) -> Result<()>;

    /// Remove an expression together with its tasks and results.
    fn discard_expression(&self, id: ExpressionId) -> Result<()>;
}
