//! Backend error types for mptree storage.
//!
//! This module defines structured error types for storage operations,
//! providing better error context and type safety compared to string-based errors.

use thiserror::Error;

use crate::node::NodeId;

/// Errors that can occur during backend operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Field additions/changes require a major version bump
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// The named tree has not been created in this backend.
    #[error("Tree not found: {tree}")]
    TreeNotFound {
        /// The name of the tree that was not found
        tree: String,
    },

    /// A row update targeted a node that does not exist.
    #[error("Node {id} not found in tree {tree}")]
    NodeNotFound {
        /// The tree that was searched
        tree: String,
        /// The missing node
        id: NodeId,
    },

    /// A write would create a second row with the same path or id.
    #[error("Unique constraint violated: {reason}")]
    UniqueViolation {
        /// Which key collided
        reason: String,
    },

    /// A write was attempted through a read-only transaction.
    #[error("Write attempted in a read-only transaction on tree {tree}")]
    ReadOnlyTransaction {
        /// The tree the transaction was opened on
        tree: String,
    },

    /// Another transaction holds the locks this one needs, or the database
    /// aborted the transaction to resolve a conflict. Safe to retry.
    #[error("Transaction conflict: {reason}")]
    Conflict {
        /// Description of the conflict
        reason: String,
    },

    /// A stored row could not be converted into a node.
    #[error("Corrupt row: {reason}")]
    CorruptRow {
        /// What was wrong with the row
        reason: String,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// SQL database operation failed.
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("SQL error: {reason}")]
    SqlxError {
        /// Description of what failed
        reason: String,
        /// The underlying sqlx error, when there is one
        #[source]
        source: Option<sqlx::Error>,
    },
}

impl BackendError {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BackendError::TreeNotFound { .. } | BackendError::NodeNotFound { .. }
        )
    }

    /// Check if the failed transaction may succeed when retried.
    pub fn is_conflict(&self) -> bool {
        matches!(self, BackendError::Conflict { .. })
    }

    /// Check if this error indicates a data integrity issue.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            BackendError::UniqueViolation { .. } | BackendError::CorruptRow { .. }
        )
    }

    /// Check if this error is related to I/O operations.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            BackendError::FileIo { .. }
                | BackendError::SerializationFailed { .. }
                | BackendError::DeserializationFailed { .. }
        )
    }

    /// Get the tree name if this error is about a specific tree.
    pub fn tree(&self) -> Option<&str> {
        match self {
            BackendError::TreeNotFound { tree }
            | BackendError::NodeNotFound { tree, .. }
            | BackendError::ReadOnlyTransaction { tree } => Some(tree),
            _ => None,
        }
    }
}

// Conversion from BackendError to the main Error type
impl From<BackendError> for crate::Error {
    fn from(err: BackendError) -> Self {
        crate::Error::Backend(err)
    }
}
