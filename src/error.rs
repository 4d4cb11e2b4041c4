//! Error type shared by every tree operation.

use thiserror::Error;

use crate::store::NodeId;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors surfaced by tree operations.
///
/// No-op conditions (moving a node with no eligible sibling, `steps` of
/// zero) are not errors; the reorder operations report them through their
/// `Ok(false)` return value instead.
#[derive(Debug, Error)]
pub enum TreeError {
    /// No node with the given id exists in the current scope.
    #[error("node {0} not found")]
    NotFound(NodeId),
    /// A structural request that would corrupt the tree, rejected before
    /// any row is touched.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Store-level failure, propagated unmodified. The enclosing
    /// transaction has been rolled back; nothing is retried here.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}
