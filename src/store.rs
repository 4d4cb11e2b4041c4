//! Relational-store contract consumed by the tree engine.
//!
//! The engine never builds SQL itself; it expresses every read and bulk
//! mutation through this trait, and the backend renders them against the
//! configured table. Every operation is implicitly restricted to the
//! configured scope so distinct forests never interact.

use crate::config::TreeConfig;
use crate::error::Result;

/// Primary key of a governed row.
pub type NodeId = i64;

/// Structural fields of one row, as read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRow {
    /// Primary key.
    pub id: NodeId,
    /// Parent reference; `None` for roots.
    pub parent: Option<NodeId>,
    /// Left interval boundary.
    pub lft: i64,
    /// Right interval boundary.
    pub rght: i64,
    /// Depth from root, when tracked.
    pub level: Option<i64>,
    /// Display label.
    pub label: String,
}

/// Column values for a row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewNode {
    /// Parent reference; `None` for roots.
    pub parent: Option<NodeId>,
    /// Left interval boundary.
    pub lft: i64,
    /// Right interval boundary.
    pub rght: i64,
    /// Depth from root, when tracked.
    pub level: Option<i64>,
    /// Display label.
    pub label: String,
}

/// Partial update of one row; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct NodeUpdate {
    /// New parent value (the inner `Option` is the column value).
    pub parent: Option<Option<NodeId>>,
    /// New left boundary.
    pub lft: Option<i64>,
    /// New right boundary.
    pub rght: Option<i64>,
    /// New depth.
    pub level: Option<i64>,
    /// New label.
    pub label: Option<String>,
}

/// Which interval boundary column a bulk shift targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// The left boundary column.
    Left,
    /// The right boundary column.
    Right,
}

/// Whether a shift adds or subtracts its amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    /// `column + amount`
    Add,
    /// `column - amount`
    Subtract,
}

/// Comparison selecting which boundary values a bulk shift applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryCond {
    /// `column >= value`
    AtLeast(i64),
    /// `column > value`
    GreaterThan(i64),
    /// `column BETWEEN low AND high` (inclusive)
    Between(i64, i64),
}

/// Side of a pivot boundary a sibling search looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingSide {
    /// Siblings whose interval ends before the pivot (earlier siblings).
    Before,
    /// Siblings whose interval starts after the pivot (later siblings).
    After,
}

/// Abstract relational store for one governed table.
///
/// Mutating methods take `&mut self`; a store value therefore admits one
/// structural writer at a time, which is the concurrency contract the
/// shift algorithms require. Transactions are explicit: the engine brackets
/// every multi-statement mutation with `begin`/`commit` and rolls back on
/// error.
pub trait TreeStore {
    /// The configuration this store was built with.
    fn config(&self) -> &TreeConfig;

    /// Reads the structural fields of one node, if present in scope.
    fn node_row(&mut self, id: NodeId) -> Result<Option<NodeRow>>;

    /// Highest right boundary in scope, 0 when the scope is empty.
    /// `exclude` ignores one row, used when that row's stored boundaries
    /// are known to be stale mid-operation.
    fn max_right(&mut self, exclude: Option<NodeId>) -> Result<i64>;

    /// Bulk-shifts one boundary column: `col = col ± shift` for every row
    /// in scope whose `col` matches `cond`. With `mark` the result is
    /// negated instead (`col = -(col ± shift)`) so a later pass over an
    /// overlapping range cannot match the row again.
    fn shift_boundary(
        &mut self,
        field: Boundary,
        shift: i64,
        dir: ShiftDirection,
        cond: BoundaryCond,
        mark: bool,
    ) -> Result<u64>;

    /// Restores the sign of every marked (negative) boundary in scope.
    fn unmark_boundaries(&mut self) -> Result<u64>;

    /// The sibling `offset` positions away from the pivot boundary on the
    /// given side, among rows sharing `parent`. Offset 0 is the adjacent
    /// sibling.
    fn sibling_at(
        &mut self,
        parent: Option<NodeId>,
        pivot: i64,
        side: SiblingSide,
        offset: u64,
    ) -> Result<Option<NodeRow>>;

    /// The farthest sibling on the given side (first sibling for
    /// `Before`, last for `After`), or `None` when no sibling exists.
    fn outermost_sibling(
        &mut self,
        parent: Option<NodeId>,
        pivot: i64,
        side: SiblingSide,
    ) -> Result<Option<NodeRow>>;

    /// Rows strictly contained by the interval `(lft, rght)`, ordered by
    /// left boundary ascending.
    fn rows_between(&mut self, lft: i64, rght: i64) -> Result<Vec<NodeRow>>;

    /// Rows whose interval contains `[lft, rght]` (bounds inclusive),
    /// ordered by left boundary ascending: the path root..node.
    fn rows_containing(&mut self, lft: i64, rght: i64) -> Result<Vec<NodeRow>>;

    /// Number of rows strictly containing the interval: the ancestor count.
    fn count_containing(&mut self, lft: i64, rght: i64) -> Result<u64>;

    /// Direct children of `parent`, ordered by left boundary ascending.
    fn children_rows(&mut self, parent: Option<NodeId>) -> Result<Vec<NodeRow>>;

    /// Number of direct children of `parent`.
    fn count_children(&mut self, parent: NodeId) -> Result<u64>;

    /// Every row in scope, ordered by left boundary ascending.
    fn all_rows(&mut self) -> Result<Vec<NodeRow>>;

    /// Ids of direct children of `parent`, ordered by the configured
    /// recovery order.
    fn child_ids(&mut self, parent: Option<NodeId>) -> Result<Vec<NodeId>>;

    /// Inserts a row (scope columns filled from the configuration) and
    /// returns its primary key.
    fn insert_node(&mut self, row: &NewNode) -> Result<NodeId>;

    /// Applies a partial update to one row.
    fn update_node(&mut self, id: NodeId, update: &NodeUpdate) -> Result<()>;

    /// Repoints every row whose parent is `from` at `to`. Returns the
    /// affected row count.
    fn reassign_children(&mut self, from: NodeId, to: Option<NodeId>) -> Result<u64>;

    /// Deletes every row whose left boundary lies in `[lft_from, lft_to]`
    /// in one statement. Returns the affected row count.
    fn delete_range(&mut self, lft_from: i64, lft_to: i64) -> Result<u64>;

    /// Deletes one row. Returns whether a row was deleted.
    fn delete_node(&mut self, id: NodeId) -> Result<bool>;

    /// Adds `delta` to the depth column of every row whose left boundary
    /// lies in `[lft_from, lft_to]`. No-op when depth is not tracked.
    fn adjust_levels(&mut self, delta: i64, lft_from: i64, lft_to: i64) -> Result<u64>;

    /// Opens a transaction.
    fn begin(&mut self) -> Result<()>;
    /// Commits the open transaction.
    fn commit(&mut self) -> Result<()>;
    /// Rolls back the open transaction.
    fn rollback(&mut self) -> Result<()>;
}
