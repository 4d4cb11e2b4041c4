//! Mutable node record with per-field change tracking.

use crate::store::{NodeId, NodeRow};

/// Fields of a [`NodeEntity`] that carry a dirty flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// The parent reference.
    Parent,
    /// The left interval boundary.
    Left,
    /// The right interval boundary.
    Right,
    /// The depth column.
    Level,
    /// The display label.
    Label,
}

impl Field {
    fn mask(self) -> u8 {
        match self {
            Field::Parent => 1,
            Field::Left => 1 << 1,
            Field::Right => 1 << 2,
            Field::Level => 1 << 3,
            Field::Label => 1 << 4,
        }
    }
}

/// Mutable in-memory record for one row of the governed table.
///
/// Callers only ever set the parent and label; the interval fields are
/// bookkeeping owned by the engine. A per-field dirty flag records which
/// fields still need persisting, so values refreshed internally (for
/// example by `ensure_fields`) do not get written back as user changes.
#[derive(Debug, Clone)]
pub struct NodeEntity {
    id: Option<NodeId>,
    parent: Option<NodeId>,
    lft: Option<i64>,
    rght: Option<i64>,
    level: Option<i64>,
    label: String,
    dirty: u8,
}

impl NodeEntity {
    /// New unsaved root-level node.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: None,
            parent: None,
            lft: None,
            rght: None,
            level: None,
            label: label.into(),
            dirty: Field::Label.mask(),
        }
    }

    /// New unsaved node under `parent`.
    pub fn child_of(parent: NodeId, label: impl Into<String>) -> Self {
        let mut entity = Self::new(label);
        entity.parent = Some(parent);
        entity.dirty |= Field::Parent.mask();
        entity
    }

    pub(crate) fn from_row(row: &NodeRow) -> Self {
        Self {
            id: Some(row.id),
            parent: row.parent,
            lft: Some(row.lft),
            rght: Some(row.rght),
            level: row.level,
            label: row.label.clone(),
            dirty: 0,
        }
    }

    /// Primary key, `None` until the entity has been saved.
    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    /// True when this entity has no persisted row yet.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Current parent reference.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Reparents the node. Takes effect on the next save.
    pub fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
        self.set_dirty(Field::Parent, true);
    }

    /// Display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Replaces the display label. Takes effect on the next save.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
        self.set_dirty(Field::Label, true);
    }

    /// Left interval boundary, if loaded.
    pub fn left(&self) -> Option<i64> {
        self.lft
    }

    /// Right interval boundary, if loaded.
    pub fn right(&self) -> Option<i64> {
        self.rght
    }

    /// Depth from root, if tracked and loaded.
    pub fn level(&self) -> Option<i64> {
        self.level
    }

    /// Whether a field holds an unpersisted change.
    pub fn is_dirty(&self, field: Field) -> bool {
        self.dirty & field.mask() != 0
    }

    pub(crate) fn set_dirty(&mut self, field: Field, dirty: bool) {
        if dirty {
            self.dirty |= field.mask();
        } else {
            self.dirty &= !field.mask();
        }
    }

    pub(crate) fn assign_id(&mut self, id: NodeId) {
        self.id = Some(id);
    }

    pub(crate) fn set_left(&mut self, lft: i64) {
        self.lft = Some(lft);
        self.set_dirty(Field::Left, true);
    }

    pub(crate) fn set_right(&mut self, rght: i64) {
        self.rght = Some(rght);
        self.set_dirty(Field::Right, true);
    }

    pub(crate) fn set_level(&mut self, level: i64) {
        self.level = Some(level);
        self.set_dirty(Field::Level, true);
    }

    /// Copies interval fields from a fresh row without marking them dirty.
    pub(crate) fn refresh_interval(&mut self, lft: i64, rght: i64) {
        self.lft = Some(lft);
        self.rght = Some(rght);
        self.set_dirty(Field::Left, false);
        self.set_dirty(Field::Right, false);
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = 0;
    }
}
