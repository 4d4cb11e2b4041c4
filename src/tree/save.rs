//! Insertion and reparenting.
//!
//! New nodes open a two-unit gap at the parent's right edge (or append
//! after the scope maximum for roots). Reparenting an existing node runs
//! the detach/shift/reattach sequence: the node's internal subtree is
//! shifted with the mark protocol, the hole between the old and new
//! position is closed, and the node's own boundaries are assigned directly.

use std::collections::HashMap;

use tracing::debug;

use crate::entity::{Field, NodeEntity};
use crate::error::{Result, TreeError};
use crate::store::{BoundaryCond, NewNode, NodeId, NodeUpdate, ShiftDirection, TreeStore};

use super::TreeEngine;

impl<S: TreeStore> TreeEngine<S> {
    /// Persists an entity, maintaining the interval columns.
    ///
    /// New entities are positioned under their parent (or as the rightmost
    /// root). For existing entities with a changed parent, the whole
    /// subtree is moved; when depth tracking is enabled the descendants'
    /// levels are recomputed in one pass afterwards.
    ///
    /// # Errors
    /// [`TreeError::InvalidArgument`] when the parent is the node itself
    /// or one of its own descendants; [`TreeError::NotFound`] when the
    /// designated parent does not exist in scope. Nothing is mutated in
    /// either case.
    pub fn save(&mut self, entity: &mut NodeEntity) -> Result<()> {
        self.transactional(|engine| engine.save_inner(entity))
    }

    pub(crate) fn save_inner(&mut self, entity: &mut NodeEntity) -> Result<()> {
        let parent = entity.parent();
        if let (Some(id), Some(parent_id)) = (entity.id(), parent) {
            if id == parent_id {
                return Err(TreeError::InvalidArgument(
                    "cannot set a node's parent as itself".into(),
                ));
            }
        }

        let level_tracked = self.config().level.is_some();

        if entity.is_new() {
            let (lft, rght, level) = match parent {
                Some(parent_id) => {
                    let parent_node = self.get_node(parent_id)?;
                    let edge = parent_node.rght;
                    // Open the gap before inserting the row itself.
                    self.sync(2, ShiftDirection::Add, BoundaryCond::AtLeast(edge), false)?;
                    let level = level_tracked.then(|| parent_node.level.unwrap_or(0) + 1);
                    (edge, edge + 1, level)
                }
                None => {
                    let edge = self.edge()?;
                    (edge + 1, edge + 2, level_tracked.then_some(0))
                }
            };
            let id = self.store().insert_node(&NewNode {
                parent,
                lft,
                rght,
                level,
                label: entity.label().to_string(),
            })?;
            entity.assign_id(id);
            entity.refresh_interval(lft, rght);
            if let Some(level) = level {
                entity.set_level(level);
            }
            entity.mark_clean();
            debug!(node = id, parent = ?parent, lft, rght, "inserted tree node");
            return Ok(());
        }

        if entity.is_dirty(Field::Parent) {
            match parent {
                Some(parent_id) => {
                    self.set_parent(entity, parent_id)?;
                    if level_tracked {
                        let parent_node = self.get_node(parent_id)?;
                        entity.set_level(parent_node.level.unwrap_or(0) + 1);
                    }
                }
                None => {
                    self.set_as_root(entity)?;
                    if level_tracked {
                        entity.set_level(0);
                    }
                }
            }
        }

        let id = entity
            .id()
            .ok_or_else(|| TreeError::InvalidArgument("entity lost its id".into()))?;
        let update = NodeUpdate {
            parent: entity.is_dirty(Field::Parent).then(|| entity.parent()),
            lft: entity.is_dirty(Field::Left).then(|| entity.left()).flatten(),
            rght: entity
                .is_dirty(Field::Right)
                .then(|| entity.right())
                .flatten(),
            level: entity
                .is_dirty(Field::Level)
                .then(|| entity.level())
                .flatten(),
            label: entity
                .is_dirty(Field::Label)
                .then(|| entity.label().to_string()),
        };
        self.store().update_node(id, &update)?;
        entity.mark_clean();

        if level_tracked {
            self.set_children_level(entity)?;
        }
        Ok(())
    }

    /// Moves an already-positioned node (and its subtree) under a new
    /// parent. The entity's boundaries are assigned in memory and marked
    /// dirty; the caller persists them.
    fn set_parent(&mut self, entity: &mut NodeEntity, parent_id: NodeId) -> Result<()> {
        let parent_node = self.get_node(parent_id)?;
        self.ensure_fields(entity)?;
        let parent_right = parent_node.rght;
        let left = entity.left().unwrap_or(0);
        let right = entity.right().unwrap_or(0);

        if parent_node.lft > left && parent_node.lft < right {
            return Err(TreeError::InvalidArgument(format!(
                "cannot use node {parent_id} as parent: it is the node itself or a descendant",
            )));
        }

        debug!(node = ?entity.id(), parent = parent_id, "reparenting subtree");

        // Values for moving to the left.
        let mut diff = right - left + 1;
        let mut target_left = parent_right;
        let mut target_right = diff + parent_right - 1;
        let mut hole_min = parent_right;
        let mut hole_max = left - 1;

        if left < target_left {
            // Moving to the right.
            target_left = parent_right - diff;
            target_right = parent_right - 1;
            hole_min = right + 1;
            hole_max = parent_right - 1;
            diff = -diff;
        }

        let has_descendants = right - left > 1;
        if has_descendants {
            // Shift the internal subtree by the node's own delta, marked
            // so the hole-closing pass below cannot match it again.
            self.sync(
                target_left - left,
                ShiftDirection::Add,
                BoundaryCond::Between(left + 1, right - 1),
                true,
            )?;
        }

        self.sync(
            diff,
            ShiftDirection::Add,
            BoundaryCond::Between(hole_min, hole_max),
            false,
        )?;

        if has_descendants {
            self.unmark_internal_tree()?;
        }

        entity.set_left(target_left);
        entity.set_right(target_right);
        Ok(())
    }

    /// Detaches a positioned node (and its subtree) and re-appends it
    /// after the scope maximum, making it the rightmost root.
    pub(crate) fn set_as_root(&mut self, entity: &mut NodeEntity) -> Result<()> {
        let edge = self.edge()?;
        self.ensure_fields(entity)?;
        let left = entity.left().unwrap_or(0);
        let right = entity.right().unwrap_or(0);
        let diff = right - left;

        debug!(node = ?entity.id(), "detaching node as rightmost root");

        let has_descendants = right - left > 1;
        if has_descendants {
            self.sync(
                edge - diff - left,
                ShiftDirection::Add,
                BoundaryCond::Between(left + 1, right - 1),
                true,
            )?;
        }

        self.sync(
            diff + 1,
            ShiftDirection::Subtract,
            BoundaryCond::Between(right, edge),
            false,
        )?;

        if has_descendants {
            self.unmark_internal_tree()?;
        }

        entity.set_left(edge - diff);
        entity.set_right(edge);
        Ok(())
    }

    /// Recomputes the depth of every descendant in one pass. Ordering by
    /// left boundary visits parents before children, so a single map of
    /// already-assigned depths suffices.
    fn set_children_level(&mut self, entity: &mut NodeEntity) -> Result<()> {
        self.ensure_fields(entity)?;
        let left = entity.left().unwrap_or(0);
        let right = entity.right().unwrap_or(0);
        if left + 1 == right {
            return Ok(());
        }
        let id = entity
            .id()
            .ok_or_else(|| TreeError::InvalidArgument("entity lost its id".into()))?;
        let base_level = entity.level().unwrap_or(0);

        let mut depths: HashMap<NodeId, i64> = HashMap::new();
        depths.insert(id, base_level);

        let rows = self.store().rows_between(left, right)?;
        for row in rows {
            let parent_id = row.parent.ok_or_else(|| {
                TreeError::InvalidArgument(format!(
                    "node {} sits inside a subtree but has no parent",
                    row.id
                ))
            })?;
            let depth = depths.get(&parent_id).copied().unwrap_or(base_level) + 1;
            depths.insert(row.id, depth);
            self.store().update_node(
                row.id,
                &NodeUpdate {
                    level: Some(depth),
                    ..Default::default()
                },
            )?;
        }
        Ok(())
    }
}
