//! Interval shift primitive.
//!
//! Every structural operation is built from bulk shifts of the left and
//! right boundary columns. A single logical move sometimes needs two shift
//! passes whose numeric ranges overlap; the first pass then runs with
//! `mark` set, which stores the shifted value negated so the second pass
//! cannot match the row again. Once the conflicting pass is done,
//! `unmark_boundaries` flips the signs back. No row may still be marked
//! when a new mark pass begins.

use crate::error::Result;
use crate::store::{Boundary, BoundaryCond, ShiftDirection, TreeStore};

use super::TreeEngine;

impl<S: TreeStore> TreeEngine<S> {
    /// Shifts the left and right columns independently: every boundary in
    /// scope matching `cond` moves by `shift` in `dir`. Not idempotent;
    /// never retried. Store errors surface unaltered.
    pub(crate) fn sync(
        &mut self,
        shift: i64,
        dir: ShiftDirection,
        cond: BoundaryCond,
        mark: bool,
    ) -> Result<()> {
        for field in [Boundary::Left, Boundary::Right] {
            self.store().shift_boundary(field, shift, dir, cond, mark)?;
        }
        Ok(())
    }

    /// Restores the sign of boundaries negated by a marked sync pass.
    pub(crate) fn unmark_internal_tree(&mut self) -> Result<()> {
        self.store().unmark_boundaries()?;
        Ok(())
    }
}
