//! Error types for tree operations.
//!
//! Path-level failures (overflow, malformed paths) live in
//! [`crate::path::PathError`]; storage failures in
//! [`crate::backend::BackendError`]. This module covers mistakes in how an
//! operation was requested and tree states the store refuses to work on.

use thiserror::Error;

use crate::node::NodeId;

/// Errors raised by [`TreeStore`](super::TreeStore) operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    /// No node with this id exists in the tree.
    #[error("Node not found: {id}")]
    NodeNotFound {
        /// The id that was looked up
        id: NodeId,
    },

    /// No node is stored at this path.
    #[error("No node at path '{path}'")]
    PathNotFound {
        /// The path that was looked up
        path: String,
    },

    /// A node cannot be moved into its own subtree.
    #[error("Cannot move node {node} relative to its descendant {target}")]
    InvalidMoveToDescendant {
        /// The node being moved
        node: NodeId,
        /// The requested target
        target: NodeId,
    },

    /// The position is not valid for the operation.
    #[error("Position '{position}' is not valid for {operation}")]
    InvalidPosition {
        /// The rejected position, as given
        position: String,
        /// The operation that rejected it
        operation: String,
    },

    /// The tree configuration is unusable.
    #[error("Invalid tree configuration: {reason}")]
    InvalidConfiguration {
        /// What is wrong with it
        reason: String,
    },

    /// Stored rows contradict the tree invariants in a way the operation
    /// cannot work around. `fix_tree` or manual repair is needed.
    #[error("Tree integrity violation: {reason}")]
    IntegrityViolation {
        /// Description of the broken invariant
        reason: String,
    },
}

impl TreeError {
    /// Check if this error indicates a node or path was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TreeError::NodeNotFound { .. } | TreeError::PathNotFound { .. }
        )
    }

    /// Check if this error rejected a move into the node's own subtree.
    pub fn is_invalid_move(&self) -> bool {
        matches!(self, TreeError::InvalidMoveToDescendant { .. })
    }

    /// Check if this error rejected a position argument.
    pub fn is_invalid_position(&self) -> bool {
        matches!(self, TreeError::InvalidPosition { .. })
    }

    /// Check if this error reports broken stored data.
    pub fn is_integrity_error(&self) -> bool {
        matches!(self, TreeError::IntegrityViolation { .. })
    }
}

impl From<TreeError> for crate::Error {
    fn from(err: TreeError) -> Self {
        crate::Error::Tree(err)
    }
}
