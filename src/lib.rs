//! Nested-set tree maintenance over a relational store.
//!
//! A hierarchy stored as a `parent` adjacency column is kept synchronized
//! with a pair of interval columns (`lft`, `rght`) encoding the tree as
//! nested numeric ranges, so ancestor/descendant/depth queries run as
//! plain range comparisons instead of recursive joins. The
//! [`TreeEngine`] owns those columns entirely: inserts open gaps, moves
//! run a detach/shift/reattach sequence of bulk boundary shifts, deletes
//! close the vacated range, and [`TreeEngine::recover`] rebuilds all
//! boundaries from the adjacency column alone.
//!
//! Storage is abstracted behind the [`TreeStore`] trait; [`SqliteStore`]
//! is the bundled SQLite backend. All multi-statement mutations run in one
//! transaction and assume a single structural writer per scope.
//!
//! ```no_run
//! use canopy::{NodeEntity, SqliteStore, TreeConfig, TreeEngine};
//!
//! # fn main() -> canopy::Result<()> {
//! let store = SqliteStore::open_in_memory(TreeConfig::default())?;
//! let mut tree = TreeEngine::new(store);
//!
//! let mut root = NodeEntity::new("electronics");
//! tree.save(&mut root)?;
//! let mut child = NodeEntity::child_of(root.id().unwrap(), "televisions");
//! tree.save(&mut child)?;
//!
//! let mut root = tree.node(root.id().unwrap())?;
//! assert_eq!(tree.child_count(&mut root, false)?, 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod entity;
pub mod error;
pub mod sqlite;
pub mod store;
pub mod tree;
pub mod verify;

pub use config::TreeConfig;
pub use entity::{Field, NodeEntity};
pub use error::{Result, TreeError};
pub use sqlite::SqliteStore;
pub use store::{NewNode, NodeId, NodeRow, NodeUpdate, TreeStore};
pub use tree::{Steps, TreeEngine};
pub use verify::{VerifyFinding, VerifyReport, VerifySeverity};
