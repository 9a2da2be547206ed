// src/engine/core.rs

//! The engine: one lock around all state, plus the storage collaborator.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};
use std::time::Instant;

use anyhow::anyhow;
use regex::Regex;
use tracing::debug;

use crate::compiler::compile;
use crate::config::model::ConfigFile;
use crate::dag::graph::ExpressionGraph;
use crate::dag::task::TaskAssignment;
use crate::engine::handlers::{
    handle_dispatch, handle_lease_sweep, handle_literal, handle_submission, handle_task_error,
    handle_task_result,
};
use crate::engine::state::EngineState;
use crate::errors::{CalcError, Result};
use crate::storage::{MemoryStorage, Storage};
use crate::types::{Expression, ExpressionId, OwnerId, TaskId};

static SIMPLE_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?\d+(\.\d+)?$").unwrap_or_else(|err| panic!("invalid literal pattern: {err}"))
});

/// Passive evaluation engine.
///
/// Owns no threads. Every public operation takes the state lock for its
/// whole duration, so operations are linearizable. Share it between
/// workers with an `Arc`.
#[derive(Debug)]
pub struct Engine {
    state: Mutex<EngineState>,
    storage: Arc<dyn Storage>,
    config: ConfigFile,
}

impl Engine {
    pub fn new(config: ConfigFile, storage: Arc<dyn Storage>) -> Self {
        Self {
            state: Mutex::new(EngineState::new()),
            storage,
            config,
        }
    }

    /// Engine backed by a fresh [`MemoryStorage`].
    pub fn in_memory(config: ConfigFile) -> Self {
        Self::new(config, Arc::new(MemoryStorage::new()))
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, EngineState>> {
        self.state
            .lock()
            .map_err(|_| CalcError::Internal(anyhow!("engine state lock poisoned")))
    }

    /// Compile `text` and register its task graph.
    pub fn add_expression(&self, owner: OwnerId, text: &str) -> Result<ExpressionId> {
        let compiled = compile(text)?;
        let mut state = self.lock()?;
        handle_submission(&mut state, self.storage.as_ref(), owner, text, &compiled)
    }

    /// Register a plain number without building a task graph.
    pub fn add_simple_expression(&self, owner: OwnerId, literal: &str) -> Result<ExpressionId> {
        let trimmed = literal.trim();
        if !SIMPLE_LITERAL.is_match(trimmed) {
            return Err(CalcError::InvalidExpression(format!(
                "{literal:?} is not a number"
            )));
        }
        let value: f64 = trimmed
            .parse()
            .map_err(|_| CalcError::InvalidExpression(format!("{literal:?} is not a number")))?;

        let mut state = self.lock()?;
        handle_literal(&mut state, self.storage.as_ref(), owner, literal, value)
    }

    /// Route plain numbers to [`add_simple_expression`] and everything else
    /// to [`add_expression`].
    ///
    /// [`add_simple_expression`]: Engine::add_simple_expression
    /// [`add_expression`]: Engine::add_expression
    pub fn submit(&self, owner: OwnerId, text: &str) -> Result<ExpressionId> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CalcError::InvalidExpression("empty expression".to_string()));
        }

        if SIMPLE_LITERAL.is_match(trimmed) {
            debug!(owner, "submission routed as simple literal");
            self.add_simple_expression(owner, text)
        } else {
            self.add_expression(owner, text)
        }
    }

    /// Snapshot of one expression, falling back to storage for ids not held
    /// in memory.
    pub fn get_expression(&self, owner: OwnerId, id: ExpressionId) -> Result<Expression> {
        let in_memory = {
            let state = self.lock()?;
            if state.is_abandoned(id) {
                return Err(CalcError::ExpressionNotFound(id));
            }
            state.expressions.get(&id).map(|entry| entry.expression.clone())
        };

        let expression = match in_memory {
            Some(expression) => expression,
            None => self
                .storage
                .load_expression(id)?
                .ok_or(CalcError::ExpressionNotFound(id))?,
        };

        if expression.owner != owner {
            return Err(CalcError::Unauthorized {
                expression: id,
                owner,
            });
        }

        Ok(expression)
    }

    /// All expressions of `owner`, ordered by id.
    pub fn get_all_expressions(&self, owner: OwnerId) -> Result<Vec<Expression>> {
        let state = self.lock()?;

        let mut all: BTreeMap<ExpressionId, Expression> = self
            .storage
            .list_expressions()?
            .into_iter()
            .filter(|expression| expression.owner == owner && !state.is_abandoned(expression.id))
            .map(|expression| (expression.id, expression))
            .collect();

        for (id, entry) in state.expressions.iter() {
            if entry.expression.owner == owner {
                all.insert(*id, entry.expression.clone());
            }
        }

        Ok(all.into_values().collect())
    }

    /// Hand out the first ready task, or [`CalcError::NoTaskAvailable`].
    pub fn get_next_task(&self) -> Result<TaskAssignment> {
        self.get_next_task_at(Instant::now())
    }

    /// [`get_next_task`](Engine::get_next_task) with an explicit clock.
    pub fn get_next_task_at(&self, now: Instant) -> Result<TaskAssignment> {
        let mut state = self.lock()?;
        let step = handle_dispatch(
            &mut state,
            &self.config.durations,
            self.config.engine.lease_timeout(),
            now,
        );
        step.dispatched.ok_or(CalcError::NoTaskAvailable)
    }

    pub fn set_task_result(&self, task: TaskId, value: f64) -> Result<()> {
        let mut state = self.lock()?;
        handle_task_result(&mut state, self.storage.as_ref(), task, value)
    }

    pub fn set_task_error(&self, task: TaskId, message: &str) -> Result<()> {
        let mut state = self.lock()?;
        handle_task_error(&mut state, self.storage.as_ref(), task, message)
    }

    /// Requeue every dispatched task whose lease has expired.
    pub fn sweep_expired_leases(&self) -> Result<Vec<TaskId>> {
        self.sweep_expired_leases_at(Instant::now())
    }

    pub fn sweep_expired_leases_at(&self, now: Instant) -> Result<Vec<TaskId>> {
        let mut state = self.lock()?;
        Ok(handle_lease_sweep(&mut state, now))
    }

    /// Number of tasks waiting in the pending queue.
    pub fn pending_task_count(&self) -> Result<usize> {
        Ok(self.lock()?.scheduler.pending_len())
    }

    /// Task graph of an expression; `None` for unknown ids and pure literals.
    pub fn expression_graph(&self, id: ExpressionId) -> Result<Option<ExpressionGraph>> {
        let state = self.lock()?;
        Ok(state.expressions.get(&id).and_then(|entry| entry.graph.clone()))
    }
}
