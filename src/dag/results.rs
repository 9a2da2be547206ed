// src/dag/results.rs

//! Result store: the outcome slot of every task and expression root.

use std::collections::HashMap;
use std::fmt;

use crate::types::{ExpressionId, TaskId};

/// Deterministic identifier of a result slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKey {
    Task {
        expression: ExpressionId,
        task: TaskId,
    },
    Root(ExpressionId),
}

impl ResultKey {
    pub fn task(expression: ExpressionId, task: TaskId) -> Self {
        ResultKey::Task { expression, task }
    }

    pub fn root(expression: ExpressionId) -> Self {
        ResultKey::Root(expression)
    }
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultKey::Task { expression, task } => write!(f, "expr_{expression}_task_{task}"),
            ResultKey::Root(expression) => write!(f, "expr_{expression}_root"),
        }
    }
}

/// Outcome held by a result slot.
///
/// A `Failed` slot never resolves: dependents stay blocked instead of
/// reading a placeholder value.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultState {
    Pending,
    Value(f64),
    Failed(String),
}

impl ResultState {
    pub fn value(&self) -> Option<f64> {
        match self {
            ResultState::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ResultState::Value(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ResultState::Failed(_))
    }
}

#[derive(Debug, Default)]
pub struct ResultStore {
    records: HashMap<ResultKey, ResultState>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    pub fn get(&self, key: &ResultKey) -> Option<&ResultState> {
        self.records.get(key)
    }

    /// Value of a completed slot; `None` if missing, pending or failed.
    pub fn value_of(&self, key: &ResultKey) -> Option<f64> {
        self.records.get(key).and_then(ResultState::value)
    }

    pub fn is_completed(&self, key: &ResultKey) -> bool {
        self.records.get(key).is_some_and(ResultState::is_completed)
    }

    pub fn is_failed(&self, key: &ResultKey) -> bool {
        self.records.get(key).is_some_and(ResultState::is_failed)
    }

    /// Open a slot in the `Pending` state unless it already exists.
    pub fn open(&mut self, key: ResultKey) {
        self.records.entry(key).or_insert(ResultState::Pending);
    }

    /// Write a terminal outcome. Returns `false` (and leaves the slot
    /// untouched) if the slot is already terminal.
    pub fn settle(&mut self, key: ResultKey, state: ResultState) -> bool {
        let slot = self.records.entry(key).or_insert(ResultState::Pending);
        if !matches!(slot, ResultState::Pending) {
            return false;
        }
        *slot = state;
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
