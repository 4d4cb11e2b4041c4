//! Nested-set maintenance engine.
//!
//! One `TreeEngine` governs one table (or one scope of it). The impl is
//! split across sibling modules: `sync` holds the bulk-shift primitive,
//! `save`/`delete`/`reorder` the structural mutations, `finders` the
//! interval-range queries and `recover` the adjacency rebuild.

mod delete;
mod finders;
mod recover;
mod reorder;
mod save;
mod sync;

pub use reorder::Steps;

use tracing::warn;

use crate::config::TreeConfig;
use crate::entity::NodeEntity;
use crate::error::{Result, TreeError};
use crate::store::{NodeId, NodeRow, TreeStore};
use crate::verify::{self, VerifyReport};

/// Maintains the left/right interval columns of a table storing a
/// hierarchy as a `parent` adjacency list.
///
/// All multi-statement mutations run inside one transaction and either
/// commit together or roll back together. The engine assumes a single
/// structural writer per scope; it does not serialize concurrent callers.
pub struct TreeEngine<S: TreeStore> {
    store: S,
    tx_depth: usize,
}

impl<S: TreeStore> TreeEngine<S> {
    /// Wraps a store.
    pub fn new(store: S) -> Self {
        Self { store, tx_depth: 0 }
    }

    /// The configuration of the underlying store.
    pub fn config(&self) -> &TreeConfig {
        self.store.config()
    }

    /// Loads a node as a mutable entity.
    ///
    /// # Errors
    /// [`TreeError::NotFound`] when the id has no row in the current scope.
    pub fn node(&mut self, id: NodeId) -> Result<NodeEntity> {
        Ok(NodeEntity::from_row(&self.get_node(id)?))
    }

    /// Checks every structural invariant of the current scope.
    pub fn verify(&mut self) -> Result<VerifyReport> {
        verify::verify_scope(&mut self.store)
    }

    pub(crate) fn store(&mut self) -> &mut S {
        &mut self.store
    }

    /// Reads the structural fields of one node or fails with NotFound.
    pub(crate) fn get_node(&mut self, id: NodeId) -> Result<NodeRow> {
        self.store.node_row(id)?.ok_or(TreeError::NotFound(id))
    }

    /// Highest right boundary in scope (the `edge`), 0 when empty.
    pub(crate) fn edge(&mut self) -> Result<i64> {
        self.store.max_right(None)
    }

    /// Refreshes an entity's interval fields from the store when they are
    /// missing, without marking them dirty: the values are internal
    /// bookkeeping, not caller changes to persist.
    pub(crate) fn ensure_fields(&mut self, entity: &mut NodeEntity) -> Result<()> {
        if entity.left().is_some() && entity.right().is_some() {
            return Ok(());
        }
        let id = entity.id().ok_or_else(|| {
            TreeError::InvalidArgument("node has no persisted row to refresh from".into())
        })?;
        let row = self.get_node(id)?;
        entity.refresh_interval(row.lft, row.rght);
        Ok(())
    }

    /// Runs `op` inside one transaction, rolling back on error.
    ///
    /// Re-entrant: nested calls join the transaction already open on this
    /// engine, so composite operations stay atomic as a whole.
    pub(crate) fn transactional<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if self.tx_depth > 0 {
            self.tx_depth += 1;
            let result = op(self);
            self.tx_depth -= 1;
            return result;
        }

        self.store.begin()?;
        self.tx_depth = 1;
        let result = op(self);
        self.tx_depth = 0;
        match result {
            Ok(value) => {
                self.store.commit()?;
                Ok(value)
            }
            Err(err) => {
                warn!(error = %err, "tree operation rolled back");
                if let Err(rollback_err) = self.store.rollback() {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}
