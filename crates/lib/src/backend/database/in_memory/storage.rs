//! Transactions over an in-memory tree table.

use async_trait::async_trait;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard};

use super::TreeTable;
use crate::Result;
use crate::backend::errors::BackendError;
use crate::backend::{TreeTxn, TxnMode};
use crate::node::{Node, NodeId};
use crate::path::upper_bound;

enum Guard {
    Read(OwnedRwLockReadGuard<TreeTable>),
    Write {
        guard: OwnedRwLockWriteGuard<TreeTable>,
        working: TreeTable,
    },
}

/// Transaction over one [`TreeTable`].
///
/// Writers edit `working`, a copy taken at `begin`; `commit` swaps it in
/// while the write guard is still held.
pub(crate) struct InMemoryTxn {
    tree: String,
    guard: Guard,
}

impl InMemoryTxn {
    pub(crate) fn read(tree: &str, guard: OwnedRwLockReadGuard<TreeTable>) -> Self {
        Self {
            tree: tree.to_string(),
            guard: Guard::Read(guard),
        }
    }

    pub(crate) fn write(tree: &str, guard: OwnedRwLockWriteGuard<TreeTable>) -> Self {
        let mut working = (*guard).clone();
        working.revision += 1;
        Self {
            tree: tree.to_string(),
            guard: Guard::Write { guard, working },
        }
    }

    fn table(&self) -> &TreeTable {
        match &self.guard {
            Guard::Read(guard) => &**guard,
            Guard::Write { working, .. } => working,
        }
    }

    fn table_mut(&mut self) -> Result<&mut TreeTable> {
        match &mut self.guard {
            Guard::Write { working, .. } => Ok(working),
            Guard::Read(_) => Err(BackendError::ReadOnlyTransaction {
                tree: self.tree.clone(),
            }
            .into()),
        }
    }

    fn node_mut(&mut self, id: &NodeId) -> Result<&mut Node> {
        let tree = self.tree.clone();
        let table = self.table_mut()?;
        let path = table.paths.get(id).cloned();
        path.and_then(|path| table.nodes.get_mut(&path))
            .ok_or_else(|| BackendError::NodeNotFound { tree, id: *id }.into())
    }

    /// Paths in `[prefix, upper_bound(prefix))`, in order.
    fn range_paths(&self, prefix: &str) -> Vec<String> {
        self.table()
            .nodes
            .range(prefix.to_string()..upper_bound(prefix))
            .map(|(path, _)| path.clone())
            .collect()
    }
}

#[async_trait]
impl TreeTxn for InMemoryTxn {
    fn mode(&self) -> TxnMode {
        match self.guard {
            Guard::Read(_) => TxnMode::Read,
            Guard::Write { .. } => TxnMode::Write,
        }
    }

    async fn get(&mut self, id: &NodeId) -> Result<Option<Node>> {
        let table = self.table();
        Ok(table
            .paths
            .get(id)
            .and_then(|path| table.nodes.get(path))
            .cloned())
    }

    async fn get_by_path(&mut self, path: &str) -> Result<Option<Node>> {
        Ok(self.table().nodes.get(path).cloned())
    }

    async fn get_by_paths(&mut self, paths: &[&str]) -> Result<Vec<Node>> {
        let table = self.table();
        let mut found: Vec<Node> = paths
            .iter()
            .filter_map(|path| table.nodes.get(*path).cloned())
            .collect();
        found.sort_by(|a, b| a.path().cmp(b.path()));
        found.dedup_by(|a, b| a.path() == b.path());
        Ok(found)
    }

    async fn scan(&mut self, prefix: &str, depth: Option<usize>) -> Result<Vec<Node>> {
        Ok(self
            .table()
            .nodes
            .range(prefix.to_string()..upper_bound(prefix))
            .filter(|(path, node)| {
                path.len() > prefix.len() && depth.is_none_or(|d| node.depth() == d)
            })
            .map(|(_, node)| node.clone())
            .collect())
    }

    async fn count(&mut self, prefix: &str) -> Result<u64> {
        let total = self
            .table()
            .nodes
            .range(prefix.to_string()..upper_bound(prefix))
            .filter(|(path, _)| path.len() > prefix.len())
            .count();
        Ok(total as u64)
    }

    async fn insert(&mut self, node: &Node) -> Result<()> {
        let table = self.table_mut()?;
        if table.nodes.contains_key(node.path()) {
            return Err(BackendError::UniqueViolation {
                reason: format!("path '{}' already exists", node.path()),
            }
            .into());
        }
        if table.paths.contains_key(&node.id()) {
            return Err(BackendError::UniqueViolation {
                reason: format!("node id {} already exists", node.id()),
            }
            .into());
        }
        table.paths.insert(node.id(), node.path().to_string());
        table.nodes.insert(node.path().to_string(), node.clone());
        Ok(())
    }

    async fn relocate(
        &mut self,
        old_prefix: &str,
        new_prefix: &str,
        depth_delta: i64,
    ) -> Result<u64> {
        let moving = self.range_paths(old_prefix);
        let table = self.table_mut()?;

        let mut detached = Vec::with_capacity(moving.len());
        for path in &moving {
            if let Some(node) = table.nodes.remove(path) {
                detached.push(node);
            }
        }
        for mut node in detached {
            let new_path = format!("{new_prefix}{}", &node.path()[old_prefix.len()..]);
            if table.nodes.contains_key(&new_path) {
                return Err(BackendError::UniqueViolation {
                    reason: format!("relocation target '{new_path}' already exists"),
                }
                .into());
            }
            let depth = (node.depth() as i64 + depth_delta).max(0) as usize;
            node.set_path(new_path.clone(), depth);
            table.paths.insert(node.id(), new_path.clone());
            table.nodes.insert(new_path, node);
        }
        Ok(moving.len() as u64)
    }

    async fn set_numchild(&mut self, id: &NodeId, numchild: u64) -> Result<()> {
        self.node_mut(id)?.set_numchild(numchild);
        Ok(())
    }

    async fn set_depth(&mut self, id: &NodeId, depth: usize) -> Result<()> {
        self.node_mut(id)?.set_depth(depth);
        Ok(())
    }

    async fn set_data(&mut self, id: &NodeId, data: &serde_json::Value) -> Result<()> {
        self.node_mut(id)?.set_data(data.clone());
        Ok(())
    }

    async fn delete_prefix(&mut self, prefix: &str) -> Result<u64> {
        let doomed = self.range_paths(prefix);
        let table = self.table_mut()?;
        for path in &doomed {
            if let Some(node) = table.nodes.remove(path) {
                table.paths.remove(&node.id());
            }
        }
        Ok(doomed.len() as u64)
    }

    async fn revision(&mut self) -> Result<u64> {
        Ok(self.table().revision)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        if let Guard::Write { mut guard, working } = self.guard {
            *guard = working;
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
