//!
//! mptree: ordered forests stored as materialized paths in a flat table.
//! This library provides the tree store and the storage backends it runs on.
//!
//! ## Core Concepts
//!
//! * **Paths (`path::PathCodec`)**: Every node's position is a string of fixed-width segments over a fixed alphabet. The path of a node starts with its parent's path, and lexicographic path order is tree pre-order.
//! * **Nodes (`node::Node`)**: A row holding id, path, depth, child count, kind and a JSON payload owned by the application.
//! * **Backends (`backend::BackendImpl`)**: A pluggable transactional storage layer for tree tables (in-memory, SQLite, PostgreSQL).
//! * **TreeStore (`store::TreeStore`)**: The only writer of tree shape. Every insert, move and delete runs in one transaction and keeps paths, depths and child counts consistent.
//! * **Kinds (`registry::KindRegistry`)**: Optional rules about which node kinds may be placed where.
//! * **NodeCache (`cache::NodeCache`)**: An explicit per-request read cache, invalidated by tree revision.

pub mod backend;
pub mod cache;
pub mod config;
pub mod constants;
pub mod node;
pub mod path;
pub mod position;
pub mod registry;
pub mod store;

pub use config::TreeConfig;
pub use node::{Node, NodeId, NodeSpec};
pub use path::PathCodec;
pub use position::Position;
pub use store::TreeStore;

/// Result type used throughout the mptree library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the mptree library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured path encoding errors from the path module
    #[error(transparent)]
    Path(path::PathError),

    /// Structured storage errors from the backend module
    #[error(transparent)]
    Backend(backend::BackendError),

    /// Structured tree operation errors from the store module
    #[error(transparent)]
    Tree(store::TreeError),

    /// Structured node kind errors from the registry module
    #[error(transparent)]
    Registry(registry::RegistryError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Path(_) => "path",
            Error::Backend(_) => "backend",
            Error::Tree(_) => "store",
            Error::Registry(_) => "registry",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_not_found(),
            Error::Tree(tree_err) => tree_err.is_not_found(),
            Error::Registry(registry_err) => registry_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error is a transient conflict with another writer.
    /// The whole operation may be retried.
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_conflict(),
            _ => false,
        }
    }

    /// Check if a parent (or the root level) has no free child slot left.
    pub fn is_path_overflow(&self) -> bool {
        match self {
            Error::Path(path_err) => path_err.is_overflow(),
            _ => false,
        }
    }

    /// Check if a move into the node's own subtree was rejected.
    pub fn is_invalid_move(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_invalid_move(),
            _ => false,
        }
    }

    /// Check if a position argument was rejected.
    pub fn is_invalid_position(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_invalid_position(),
            _ => false,
        }
    }

    /// Check if a node kind was rejected by the kind registry.
    pub fn is_kind_rejected(&self) -> bool {
        match self {
            Error::Registry(registry_err) => registry_err.is_placement_error(),
            _ => false,
        }
    }

    /// Check if this error indicates a data integrity issue.
    pub fn is_integrity_error(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_integrity_error(),
            Error::Tree(tree_err) => tree_err.is_integrity_error(),
            Error::Path(path_err) => path_err.is_integrity_error(),
            _ => false,
        }
    }

    /// Check if this error comes from invalid configuration.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Error::Path(path_err) => path_err.is_configuration_error(),
            Error::Registry(registry_err) => registry_err.is_configuration_error(),
            Error::Tree(store::TreeError::InvalidConfiguration { .. }) => true,
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Backend(backend_err) => backend_err.is_io_error(),
            _ => false,
        }
    }
}
