//! Subtree deletion and single-node detachment.

use tracing::debug;

use crate::entity::{Field, NodeEntity};
use crate::error::{Result, TreeError};
use crate::store::{BoundaryCond, NodeUpdate, ShiftDirection, TreeStore};

use super::TreeEngine;

impl<S: TreeStore> TreeEngine<S> {
    /// Deletes a node together with its whole subtree and closes the
    /// interval gap it occupied.
    ///
    /// With `cascade_callbacks` enabled, contained rows are deleted one
    /// statement per row so store-level hooks fire for each; otherwise one
    /// bulk statement removes them all.
    pub fn delete(&mut self, entity: &mut NodeEntity) -> Result<()> {
        self.transactional(|engine| engine.delete_inner(entity))
    }

    fn delete_inner(&mut self, entity: &mut NodeEntity) -> Result<()> {
        self.ensure_fields(entity)?;
        let id = entity
            .id()
            .ok_or_else(|| TreeError::InvalidArgument("cannot delete an unsaved node".into()))?;
        let left = entity.left().unwrap_or(0);
        let right = entity.right().unwrap_or(0);
        let diff = right - left + 1;

        if diff > 2 {
            if self.config().cascade_callbacks {
                let rows = self.store().rows_between(left, right)?;
                for row in rows {
                    self.store().delete_node(row.id)?;
                }
            } else {
                self.store().delete_range(left + 1, right - 1)?;
            }
        }

        self.store().delete_node(id)?;
        self.sync(
            diff,
            ShiftDirection::Subtract,
            BoundaryCond::GreaterThan(right),
            false,
        )?;
        debug!(node = id, subtree_width = diff, "deleted subtree");
        Ok(())
    }

    /// Detaches a node from the hierarchy without deleting it or its
    /// children: direct children are reattached to the node's former
    /// parent, the vacated gap is closed, and the node itself is
    /// re-appended as the rightmost root.
    pub fn remove_from_tree(&mut self, entity: &mut NodeEntity) -> Result<()> {
        self.transactional(|engine| {
            engine.ensure_fields(entity)?;
            engine.remove_from_tree_inner(entity)
        })
    }

    fn remove_from_tree_inner(&mut self, entity: &mut NodeEntity) -> Result<()> {
        let id = entity
            .id()
            .ok_or_else(|| TreeError::InvalidArgument("cannot detach an unsaved node".into()))?;
        let left = entity.left().unwrap_or(0);
        let right = entity.right().unwrap_or(0);
        let parent = entity.parent();

        entity.set_parent(None);

        if right - left == 1 {
            // A leaf detaches through the ordinary root-append path.
            return self.save_inner(entity);
        }

        debug!(node = id, "detaching node, reattaching children");

        self.store().reassign_children(id, parent)?;
        self.sync(
            1,
            ShiftDirection::Subtract,
            BoundaryCond::Between(left + 1, right - 1),
            false,
        )?;
        self.sync(
            2,
            ShiftDirection::Subtract,
            BoundaryCond::GreaterThan(right),
            false,
        )?;

        let level_tracked = self.config().level.is_some();
        if level_tracked {
            // The reattached former descendants now occupy
            // [left, right - 2] and sit one level closer to the root.
            self.store().adjust_levels(-1, left, right - 2)?;
        }

        // The node's own stored boundaries are stale at this point, so it
        // is excluded from the edge computation.
        let edge = self.store().max_right(Some(id))?;
        let lft = edge + 1;
        let rght = edge + 2;
        self.store().update_node(
            id,
            &NodeUpdate {
                parent: Some(None),
                lft: Some(lft),
                rght: Some(rght),
                level: level_tracked.then_some(0),
                ..Default::default()
            },
        )?;

        entity.refresh_interval(lft, rght);
        entity.set_dirty(Field::Parent, false);
        if level_tracked {
            entity.set_level(0);
            entity.set_dirty(Field::Level, false);
        }
        Ok(())
    }
}
