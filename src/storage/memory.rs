// src/storage/memory.rs

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow};

use super::Storage;
use crate::dag::results::{ResultKey, ResultState};
use crate::dag::task::Task;
use crate::types::{Expression, ExpressionId, TaskId};

#[derive(Debug, Default)]
struct Tables {
    expressions: BTreeMap<ExpressionId, Expression>,
    tasks: HashMap<TaskId, Task>,
    results: HashMap<ResultKey, ResultState>,
}

/// In-process storage backed by hash maps.
///
/// Clones share the same tables, so a test can keep a handle and inspect
/// what the engine persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))
    }

    pub fn task(&self, id: TaskId) -> Result<Option<Task>> {
        Ok(self.lock()?.tasks.get(&id).cloned())
    }

    pub fn task_count(&self) -> Result<usize> {
        Ok(self.lock()?.tasks.len())
    }

    pub fn result(&self, key: &ResultKey) -> Result<Option<ResultState>> {
        Ok(self.lock()?.results.get(key).cloned())
    }
}

impl Storage for MemoryStorage {
    fn save_expression(&self, expression: &Expression) -> Result<()> {
        let mut tables = self.lock()?;
        if tables.expressions.contains_key(&expression.id) {
            return Err(anyhow!("expression {} already stored", expression.id));
        }
        tables.expressions.insert(expression.id, expression.clone());
        Ok(())
    }

    fn update_expression(&self, expression: &Expression) -> Result<()> {
        let mut tables = self.lock()?;
        match tables.expressions.get_mut(&expression.id) {
            Some(slot) => {
                *slot = expression.clone();
                Ok(())
            }
            None => Err(anyhow!("expression {} is not stored", expression.id)),
        }
    }

    fn load_expression(&self, id: ExpressionId) -> Result<Option<Expression>> {
        Ok(self.lock()?.expressions.get(&id).cloned())
    }

    fn list_expressions(&self) -> Result<Vec<Expression>> {
        Ok(self.lock()?.expressions.values().cloned().collect())
    }

    fn save_task(&self, task: &Task) -> Result<()> {
        self.lock()?.tasks.insert(task.id, task.clone());
        Ok(())
    }

    fn save_result(&self, key: &ResultKey, state: &ResultState) -> Result<()> {
        self.lock()?.results.insert(*key, state.clone());
        Ok(())
    }

    fn discard_expression(&self, id: ExpressionId) -> Result<()> {
        let mut tables = self.lock()?;
        tables.expressions.remove(&id);
        tables.tasks.retain(|_, task| task.expression_id != id);
        tables.results.retain(|key, _| match key {
            ResultKey::Task { expression, .. } => *expression != id,
            ResultKey::Root(expression) => *expression != id,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::task::Operand;
    use crate::types::Operator;

    #[test]
    fn discard_removes_tasks_and_results_of_one_expression_only() {
        let storage = MemoryStorage::new();
        storage.save_expression(&Expression::new(1, 7, "1+2")).unwrap();
        storage.save_expression(&Expression::new(2, 7, "3+4")).unwrap();
        storage
            .save_task(&Task::new(10, 1, Operator::Add, Operand::Literal(1.0), Operand::Literal(2.0)))
            .unwrap();
        storage
            .save_task(&Task::new(11, 2, Operator::Add, Operand::Literal(3.0), Operand::Literal(4.0)))
            .unwrap();
        storage
            .save_result(&ResultKey::task(1, 10), &ResultState::Value(3.0))
            .unwrap();

        storage.discard_expression(1).unwrap();

        assert!(storage.load_expression(1).unwrap().is_none());
        assert!(storage.load_expression(2).unwrap().is_some());
        assert!(storage.task(10).unwrap().is_none());
        assert!(storage.task(11).unwrap().is_some());
        assert!(storage.result(&ResultKey::task(1, 10)).unwrap().is_none());
    }

    #[test]
    fn update_of_unknown_expression_fails() {
        let storage = MemoryStorage::new();
        assert!(storage.update_expression(&Expression::new(3, 1, "1")).is_err());
    }
}
