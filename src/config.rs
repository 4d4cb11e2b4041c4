//! Column mapping and behavioral configuration.

use serde::{Deserialize, Serialize};

/// Column mapping and behavioral options for one governed table.
///
/// The interval columns (`left`, `right`) are owned entirely by the engine
/// and must never be hand-edited by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Name of the governed table.
    pub table: String,
    /// Primary key column.
    pub primary_key: String,
    /// Adjacency column referencing the parent row; NULL means root.
    pub parent: String,
    /// Left interval boundary column.
    pub left: String,
    /// Right interval boundary column.
    pub right: String,
    /// Depth column. `None` disables depth tracking.
    pub level: Option<String>,
    /// Display column emitted by the tree-list finder.
    pub label: String,
    /// Equality conditions partitioning the table into independent
    /// forests. Applied to every structural query; left/right numbering is
    /// local to each scope.
    pub scope: Vec<(String, i64)>,
    /// Sort column used while rebuilding from adjacency data. Defaults to
    /// the primary key.
    pub recover_order: Option<String>,
    /// When deleting a subtree, delete contained rows one statement per
    /// row (store-level hooks fire per row) instead of one bulk statement.
    pub cascade_callbacks: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            table: "nodes".into(),
            primary_key: "id".into(),
            parent: "parent_id".into(),
            left: "lft".into(),
            right: "rght".into(),
            level: None,
            label: "name".into(),
            scope: Vec::new(),
            recover_order: None,
            cascade_callbacks: false,
        }
    }
}

impl TreeConfig {
    /// Default mapping with depth tracking on a `level` column.
    pub fn with_levels() -> Self {
        Self {
            level: Some("level".into()),
            ..Self::default()
        }
    }

    /// Returns a copy of this config restricted to one scope value.
    pub fn scoped_to(&self, column: &str, value: i64) -> Self {
        let mut config = self.clone();
        config.scope.push((column.to_string(), value));
        config
    }

    pub(crate) fn recover_order_column(&self) -> &str {
        self.recover_order.as_deref().unwrap_or(&self.primary_key)
    }
}
