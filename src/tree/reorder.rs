//! Sibling reordering.
//!
//! Moving a node among its siblings is a three-region cyclic shift: the
//! node's interval parks beyond the scope maximum (scratch space that
//! collides with nothing), the intervening siblings slide over the freed
//! range, and the parked interval drops into the hole. Three plain shifts,
//! no marking needed because the ranges never overlap.

use tracing::debug;

use crate::entity::NodeEntity;
use crate::error::{Result, TreeError};
use crate::store::{BoundaryCond, NodeRow, ShiftDirection, SiblingSide, TreeStore};

use super::TreeEngine;

/// How far a sibling move reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steps {
    /// Move this many positions; clamps to the first/last sibling when the
    /// count exceeds the available siblings.
    Exact(u32),
    /// Move as far as possible (first/last position).
    Extreme,
}

impl<S: TreeStore> TreeEngine<S> {
    /// Moves a node earlier among its siblings without changing its
    /// parent. Returns `Ok(false)` without touching anything when there is
    /// nothing to do: `Steps::Exact(0)` or no earlier sibling.
    pub fn move_up(&mut self, entity: &mut NodeEntity, steps: Steps) -> Result<bool> {
        if steps == Steps::Exact(0) {
            return Ok(false);
        }
        self.transactional(|engine| {
            engine.ensure_fields(entity)?;
            engine.shift_among_siblings(entity, steps, SiblingSide::Before)
        })
    }

    /// Moves a node later among its siblings without changing its parent.
    /// Returns `Ok(false)` when there is nothing to do.
    pub fn move_down(&mut self, entity: &mut NodeEntity, steps: Steps) -> Result<bool> {
        if steps == Steps::Exact(0) {
            return Ok(false);
        }
        self.transactional(|engine| {
            engine.ensure_fields(entity)?;
            engine.shift_among_siblings(entity, steps, SiblingSide::After)
        })
    }

    fn shift_among_siblings(
        &mut self,
        entity: &mut NodeEntity,
        steps: Steps,
        side: SiblingSide,
    ) -> Result<bool> {
        let id = entity
            .id()
            .ok_or_else(|| TreeError::InvalidArgument("cannot move an unsaved node".into()))?;
        let parent = entity.parent();
        let node_left = entity.left().unwrap_or(0);
        let node_right = entity.right().unwrap_or(0);
        let pivot = match side {
            SiblingSide::Before => node_left,
            SiblingSide::After => node_right,
        };

        let Some(target) = self.locate_target(parent, pivot, side, steps)? else {
            return Ok(false);
        };

        let edge = self.edge()?;
        let width = node_right - node_left + 1;
        let node_to_edge = edge + 1 - node_left;

        // Park the node's interval beyond the edge.
        self.sync(
            node_to_edge,
            ShiftDirection::Add,
            BoundaryCond::Between(node_left, node_right),
            false,
        )?;

        let (new_left, new_right, node_to_hole) = match side {
            SiblingSide::Before => {
                // Later boundary of the freed range is just before the
                // node; earlier siblings from the target onward slide right.
                let hole_start = target.lft;
                self.sync(
                    width,
                    ShiftDirection::Add,
                    BoundaryCond::Between(hole_start, node_left - 1),
                    false,
                )?;
                (
                    target.lft,
                    target.lft + (node_right - node_left),
                    edge - hole_start + 1,
                )
            }
            SiblingSide::After => {
                // Later siblings up to the target slide left.
                let hole_end = target.rght;
                self.sync(
                    width,
                    ShiftDirection::Subtract,
                    BoundaryCond::Between(node_right + 1, hole_end),
                    false,
                )?;
                (
                    target.rght - (node_right - node_left),
                    target.rght,
                    edge - hole_end + width,
                )
            }
        };

        // Drop the parked interval into the hole.
        self.sync(
            node_to_hole,
            ShiftDirection::Subtract,
            BoundaryCond::Between(edge + 1, edge + width),
            false,
        )?;

        // The node's row (and its whole subtree) moved through the bulk
        // shifts, so only the in-memory fields need refreshing.
        entity.refresh_interval(new_left, new_right);
        debug!(node = id, new_left, new_right, "reordered among siblings");
        Ok(true)
    }

    /// Finds the sibling to move next to. Steps beyond the available
    /// siblings clamp to the outermost one; `None` means no eligible
    /// sibling exists on that side.
    fn locate_target(
        &mut self,
        parent: Option<i64>,
        pivot: i64,
        side: SiblingSide,
        steps: Steps,
    ) -> Result<Option<NodeRow>> {
        if let Steps::Exact(count) = steps {
            let found = self
                .store()
                .sibling_at(parent, pivot, side, u64::from(count) - 1)?;
            if found.is_some() {
                return Ok(found);
            }
        }
        self.store().outermost_sibling(parent, pivot, side)
    }
}
