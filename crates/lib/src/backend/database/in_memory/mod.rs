//! In-memory database backend implementation
//!
//! This module provides an in-memory implementation of the `BackendImpl`
//! trait, suitable for testing, development, or deployments where the whole
//! forest fits in memory and is persisted by saving a JSON snapshot.

mod persistence;
mod storage;

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Result;
use crate::backend::errors::BackendError;
use crate::backend::{BackendImpl, TreeTxn, TxnMode};
use crate::node::{Node, NodeId};

use storage::InMemoryTxn;

/// One tree's rows, keyed by path with a secondary id index.
#[derive(Debug, Clone, Default)]
pub(crate) struct TreeTable {
    pub(crate) nodes: BTreeMap<String, Node>,
    pub(crate) paths: HashMap<NodeId, String>,
    pub(crate) revision: u64,
}

impl TreeTable {
    pub(crate) fn from_nodes(nodes: Vec<Node>, revision: u64) -> Self {
        let mut table = TreeTable {
            revision,
            ..Default::default()
        };
        for node in nodes {
            table.paths.insert(node.id(), node.path().to_string());
            table.nodes.insert(node.path().to_string(), node);
        }
        table
    }
}

/// A simple in-memory backend holding every tree in a `BTreeMap`.
///
/// Each tree sits behind its own `tokio::sync::RwLock`. Read transactions
/// share the lock; a write transaction holds it exclusively and edits a copy
/// of the table, which replaces the original on commit. An abandoned or failed
/// write therefore leaves the tree untouched.
///
/// It provides basic persistence capabilities via `save_to_file` and
/// `load_from_file`, serializing all trees to JSON.
#[derive(Debug, Default)]
pub struct InMemory {
    pub(crate) trees: RwLock<HashMap<String, Arc<RwLock<TreeTable>>>>,
}

impl InMemory {
    /// Creates a new, empty `InMemory` backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves every tree to a specified file as JSON.
    ///
    /// # Arguments
    /// * `path` - The path to the file where the state should be saved.
    ///
    /// # Returns
    /// A `Result` indicating success or an I/O or serialization error.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path).await
    }

    /// Loads the backend state from a specified JSON file.
    ///
    /// If the file does not exist, a new, empty `InMemory` backend is returned.
    ///
    /// # Arguments
    /// * `path` - The path to the file from which to load the state.
    ///
    /// # Returns
    /// A `Result` containing the loaded `InMemory` backend or an I/O or deserialization error.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        persistence::load_from_file(path).await
    }

    async fn table(&self, tree: &str) -> Result<Arc<RwLock<TreeTable>>> {
        self.trees
            .read()
            .await
            .get(tree)
            .cloned()
            .ok_or_else(|| {
                BackendError::TreeNotFound {
                    tree: tree.to_string(),
                }
                .into()
            })
    }
}

#[async_trait]
impl BackendImpl for InMemory {
    async fn ensure_tree(&self, tree: &str) -> Result<()> {
        let mut trees = self.trees.write().await;
        if !trees.contains_key(tree) {
            tracing::debug!(tree, "Creating in-memory tree");
            trees.insert(tree.to_string(), Arc::new(RwLock::new(TreeTable::default())));
        }
        Ok(())
    }

    async fn list_trees(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.trees.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn begin(&self, tree: &str, mode: TxnMode) -> Result<Box<dyn TreeTxn>> {
        let table = self.table(tree).await?;
        let txn = match mode {
            TxnMode::Read => InMemoryTxn::read(tree, table.read_owned().await),
            TxnMode::Write => InMemoryTxn::write(tree, table.write_owned().await),
        };
        Ok(Box::new(txn))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
