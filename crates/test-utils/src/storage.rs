use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Result, bail};

use calcdag::dag::{ResultKey, ResultState, Task};
use calcdag::storage::{MemoryStorage, Storage};
use calcdag::types::{Expression, ExpressionId};

/// Storage that delegates to a `MemoryStorage` but can be told to fail.
///
/// Clones share both the fault switches and the underlying tables.
#[derive(Debug, Clone, Default)]
pub struct FaultyStorage {
    inner: MemoryStorage,
    faults: Arc<Faults>,
}

#[derive(Debug, Default)]
struct Faults {
    /// Fail `save_task` once this many tasks were saved (0 = never).
    fail_task_after: AtomicUsize,
    tasks_saved: AtomicUsize,
    fail_results: AtomicBool,
    fail_updates: AtomicBool,
    fail_expressions: AtomicBool,
    fail_discards: AtomicBool,
}

impl FaultyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryStorage {
        &self.inner
    }

    /// Let `n` more `save_task` calls succeed, then fail the rest.
    pub fn fail_task_saves_after(&self, n: usize) {
        self.faults.tasks_saved.store(0, Ordering::SeqCst);
        self.faults.fail_task_after.store(n + 1, Ordering::SeqCst);
    }

    /// Let every `save_task` call through again.
    pub fn allow_task_saves(&self) {
        self.faults.fail_task_after.store(0, Ordering::SeqCst);
    }

    pub fn fail_discards(&self, fail: bool) {
        self.faults.fail_discards.store(fail, Ordering::SeqCst);
    }

    pub fn fail_result_saves(&self, fail: bool) {
        self.faults.fail_results.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.faults.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_expression_saves(&self, fail: bool) {
        self.faults.fail_expressions.store(fail, Ordering::SeqCst);
    }
}

impl Storage for FaultyStorage {
    fn save_expression(&self, expression: &Expression) -> Result<()> {
        if self.faults.fail_expressions.load(Ordering::SeqCst) {
            bail!("injected failure saving expression {}", expression.id);
        }
        self.inner.save_expression(expression)
    }

    fn update_expression(&self, expression: &Expression) -> Result<()> {
        if self.faults.fail_updates.load(Ordering::SeqCst) {
            bail!("injected failure updating expression {}", expression.id);
        }
        self.inner.update_expression(expression)
    }

    fn load_expression(&self, id: ExpressionId) -> Result<Option<Expression>> {
        self.inner.load_expression(id)
    }

    fn list_expressions(&self) -> Result<Vec<Expression>> {
        self.inner.list_expressions()
    }

    fn save_task(&self, task: &Task) -> Result<()> {
        let limit = self.faults.fail_task_after.load(Ordering::SeqCst);
        if limit > 0 {
            let saved = self.faults.tasks_saved.fetch_add(1, Ordering::SeqCst) + 1;
            if saved >= limit {
                bail!("injected failure saving task {}", task.id);
            }
        }
        self.inner.save_task(task)
    }

    fn save_result(&self, key: &ResultKey, state: &ResultState) -> Result<()> {
        if self.faults.fail_results.load(Ordering::SeqCst) {
            bail!("injected failure saving result {key}");
        }
        self.inner.save_result(key, state)
    }

    fn discard_expression(&self, id: ExpressionId) -> Result<()> {
        if self.faults.fail_discards.load(Ordering::SeqCst) {
            bail!("injected failure discarding expression {id}");
        }
        self.inner.discard_expression(id)
    }
}
