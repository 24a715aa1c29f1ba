//! Backend implementations for mptree storage
//!
//! This module provides the core `BackendImpl` trait and the backend
//! implementations organized by category.
//!
//! A backend stores flat tree tables: one row per node holding its path,
//! depth, numchild, kind and JSON payload. All tree-shape reasoning lives in
//! [`crate::store`]; backends only offer transactional row primitives keyed by
//! path ranges. This keeps every structural edit expressible as a handful of
//! range statements that an RDBMS can run against its path index.

use std::any::Any;

use async_trait::async_trait;

use crate::Result;
use crate::node::{Node, NodeId};

pub mod database;
pub mod errors;

pub use errors::BackendError;

/// Access mode requested when opening a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnMode {
    /// Consistent reads, no locks beyond what the database needs for a
    /// snapshot. Writes are rejected.
    Read,
    /// Exclusive structural writer for the tree. Bumps the tree revision.
    Write,
}

/// Storage backend for tree tables.
///
/// Implementations must be `Send` and `Sync` to allow sharing across tasks,
/// and implement `Any` to allow downcasting to a concrete backend (for
/// example to call `InMemory::save_to_file`).
#[async_trait]
pub trait BackendImpl: Send + Sync + Any {
    /// Create the named tree if it does not exist yet. Idempotent.
    async fn ensure_tree(&self, tree: &str) -> Result<()>;

    /// Names of all trees in this backend, sorted.
    async fn list_trees(&self) -> Result<Vec<String>>;

    /// Open a transaction on one tree.
    ///
    /// Write transactions on the same tree are serialized: a second writer
    /// waits (or fails with a retryable [`BackendError::Conflict`]) until the
    /// first commits or rolls back.
    ///
    /// # Errors
    /// [`BackendError::TreeNotFound`] if `ensure_tree` was never called for `tree`.
    async fn begin(&self, tree: &str, mode: TxnMode) -> Result<Box<dyn TreeTxn>>;

    /// Returns a reference to the backend instance as a dynamic `Any` type.
    fn as_any(&self) -> &dyn Any;
}

/// One open transaction on one tree.
///
/// Prefix arguments select the half-open key range `[prefix, prefix + 0x7F)`,
/// i.e. the node at `prefix` and everything stored below it. Dropping a
/// transaction without calling [`TreeTxn::commit`] discards its writes.
#[async_trait]
pub trait TreeTxn: Send {
    /// The mode this transaction was opened with.
    fn mode(&self) -> TxnMode;

    /// Look up a node by id.
    async fn get(&mut self, id: &NodeId) -> Result<Option<Node>>;

    /// Look up a node by exact path.
    async fn get_by_path(&mut self, path: &str) -> Result<Option<Node>>;

    /// Look up several paths at once. Missing paths are skipped; the result is
    /// ordered by path.
    async fn get_by_paths(&mut self, paths: &[&str]) -> Result<Vec<Node>>;

    /// Nodes strictly below `prefix` (the whole forest for `""`), optionally
    /// restricted to one depth, ordered by path.
    async fn scan(&mut self, prefix: &str, depth: Option<usize>) -> Result<Vec<Node>>;

    /// Number of nodes strictly below `prefix`.
    async fn count(&mut self, prefix: &str) -> Result<u64>;

    /// Insert a new row.
    ///
    /// # Errors
    /// [`BackendError::UniqueViolation`] if the path or id is taken.
    async fn insert(&mut self, node: &Node) -> Result<()>;

    /// Replace `old_prefix` with `new_prefix` on the node at `old_prefix` and
    /// every node below it, adding `depth_delta` to their depths. Returns the
    /// number of rows rewritten.
    ///
    /// The caller guarantees that no row exists in the destination range.
    async fn relocate(&mut self, old_prefix: &str, new_prefix: &str, depth_delta: i64)
    -> Result<u64>;

    /// Overwrite a node's numchild.
    async fn set_numchild(&mut self, id: &NodeId, numchild: u64) -> Result<()>;

    /// Overwrite a node's depth.
    async fn set_depth(&mut self, id: &NodeId, depth: usize) -> Result<()>;

    /// Overwrite a node's payload.
    async fn set_data(&mut self, id: &NodeId, data: &serde_json::Value) -> Result<()>;

    /// Delete the node at `prefix` and everything below it. Returns the number
    /// of rows removed.
    async fn delete_prefix(&mut self, prefix: &str) -> Result<u64>;

    /// The tree revision as seen by this transaction. Write transactions see
    /// the revision they will commit.
    async fn revision(&mut self) -> Result<u64>;

    /// Make all writes visible atomically.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard all writes.
    async fn rollback(self: Box<Self>) -> Result<()>;
}
