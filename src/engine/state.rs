// src/engine/state.rs

//! All mutable engine tables, owned by a single value.

use std::collections::{BTreeMap, BTreeSet};

use crate::dag::graph::ExpressionGraph;
use crate::dag::results::ResultStore;
use crate::dag::scheduler::Scheduler;
use crate::types::{Expression, ExpressionId};

/// An accepted expression and, unless it was a pure literal, its task graph.
#[derive(Debug, Clone)]
pub struct ExpressionEntry {
    pub expression: Expression,
    pub graph: Option<ExpressionGraph>,
}

impl ExpressionEntry {
    pub fn is_live(&self) -> bool {
        !self.expression.is_terminal()
    }
}

/// Engine state guarded by the engine mutex.
///
/// Handlers in [`crate::engine::handlers`] take `&mut EngineState` and are
/// never called without the lock held.
#[derive(Debug)]
pub struct EngineState {
    pub expressions: BTreeMap<ExpressionId, ExpressionEntry>,
    pub scheduler: Scheduler,
    pub results: ResultStore,
    next_expression_id: ExpressionId,
    abandoned: BTreeSet<ExpressionId>,
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineState {
    pub fn new() -> Self {
        Self {
            expressions: BTreeMap::new(),
            scheduler: Scheduler::new(),
            results: ResultStore::new(),
            next_expression_id: 1,
            abandoned: BTreeSet::new(),
        }
    }

    /// Id the next accepted expression will get.
    pub fn peek_expression_id(&self) -> ExpressionId {
        self.next_expression_id
    }

    /// Record `entry` under the id returned by [`peek_expression_id`].
    ///
    /// [`peek_expression_id`]: EngineState::peek_expression_id
    pub fn insert_expression(&mut self, entry: ExpressionEntry) -> ExpressionId {
        let id = entry.expression.id;
        self.expressions.insert(id, entry);
        self.next_expression_id = self.next_expression_id.max(id + 1);
        id
    }

    /// Retire `id` after a submission whose partial rows could not be
    /// removed from storage. The id is never handed out again and the
    /// leftover row stays hidden from lookups.
    pub fn abandon_expression_id(&mut self, id: ExpressionId) {
        self.abandoned.insert(id);
        self.next_expression_id = self.next_expression_id.max(id + 1);
    }

    pub fn is_abandoned(&self, id: ExpressionId) -> bool {
        self.abandoned.contains(&id)
    }

    /// Known and not yet terminal.
    pub fn is_live(&self, id: ExpressionId) -> bool {
        self.expressions.get(&id).is_some_and(ExpressionEntry::is_live)
    }
}
