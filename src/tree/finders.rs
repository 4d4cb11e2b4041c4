//! Read-side queries expressed as interval range comparisons.

use std::collections::HashMap;

use crate::entity::NodeEntity;
use crate::error::{Result, TreeError};
use crate::store::{NodeId, NodeRow, TreeStore};

use super::TreeEngine;

impl<S: TreeStore> TreeEngine<S> {
    /// Path from the root down to (and including) the node, top-down.
    pub fn find_path(&mut self, id: NodeId) -> Result<Vec<NodeRow>> {
        let node = self.get_node(id)?;
        self.store().rows_containing(node.lft, node.rght)
    }

    /// Children of a node: direct children only, or every descendant at
    /// any depth, ordered by left boundary.
    pub fn find_children(&mut self, id: NodeId, direct: bool) -> Result<Vec<NodeRow>> {
        let node = self.get_node(id)?;
        if direct {
            return self.store().children_rows(Some(id));
        }
        self.store().rows_between(node.lft, node.rght)
    }

    /// Number of children. The non-direct count comes straight from the
    /// interval width, with no store round trip beyond loading the
    /// boundaries.
    pub fn child_count(&mut self, entity: &mut NodeEntity, direct: bool) -> Result<u64> {
        let id = entity
            .id()
            .ok_or_else(|| TreeError::InvalidArgument("node has not been saved".into()))?;
        if direct {
            return self.store().count_children(id);
        }
        self.ensure_fields(entity)?;
        let width = entity.right().unwrap_or(0) - entity.left().unwrap_or(0);
        Ok(((width - 1) / 2) as u64)
    }

    /// Depth of a node, counted as the number of ancestors. Works whether
    /// or not a level column is tracked.
    pub fn get_level(&mut self, id: NodeId) -> Result<u64> {
        let node = self.get_node(id)?;
        self.store().count_containing(node.lft, node.rght)
    }

    /// Flattened tree list with the default spacer.
    pub fn find_tree_list(&mut self) -> Result<Vec<(NodeId, String)>> {
        self.format_tree_list("_")
    }

    /// Flattened, depth-indented id→label list: every node in scope in
    /// pre-order, its label prefixed by `spacer` repeated once per level.
    pub fn format_tree_list(&mut self, spacer: &str) -> Result<Vec<(NodeId, String)>> {
        let rows = self.store().all_rows()?;

        // Bucket by parent; the left-boundary ordering of the source query
        // keeps each bucket in sibling order.
        let mut by_parent: HashMap<Option<NodeId>, Vec<usize>> = HashMap::new();
        for (index, row) in rows.iter().enumerate() {
            by_parent.entry(row.parent).or_default().push(index);
        }

        let mut out = Vec::with_capacity(rows.len());
        emit_entries(&rows, &by_parent, None, 0, spacer, &mut out);
        Ok(out)
    }
}

fn emit_entries(
    rows: &[NodeRow],
    by_parent: &HashMap<Option<NodeId>, Vec<usize>>,
    key: Option<NodeId>,
    depth: usize,
    spacer: &str,
    out: &mut Vec<(NodeId, String)>,
) {
    let Some(indices) = by_parent.get(&key) else {
        return;
    };
    for &index in indices {
        let row = &rows[index];
        out.push((row.id, format!("{}{}", spacer.repeat(depth), row.label)));
        emit_entries(rows, by_parent, Some(row.id), depth + 1, spacer, out);
    }
}
