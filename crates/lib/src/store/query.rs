//! Read-only tree queries.
//!
//! Each query runs in its own read transaction and returns nodes in path
//! order, which is tree pre-order and sibling order.

use crate::{
    Result,
    backend::{TreeTxn, TxnMode},
    node::{Node, NodeId},
};

use super::{TreeError, TreeStore};

impl TreeStore {
    /// Fetch a node by id.
    pub async fn get(&self, id: NodeId) -> Result<Node> {
        let mut txn = self.begin(TxnMode::Read).await?;
        let result = self.load(txn.as_mut(), id).await;
        self.finish(txn, result).await
    }

    /// Fetch the node stored at `path`.
    pub async fn get_by_path(&self, path: &str) -> Result<Node> {
        self.codec().validate_path(path)?;
        let mut txn = self.begin(TxnMode::Read).await?;
        let result = match txn.get_by_path(path).await {
            Ok(Some(node)) => Ok(node),
            Ok(None) => Err(TreeError::PathNotFound {
                path: path.to_string(),
            }
            .into()),
            Err(err) => Err(err),
        };
        self.finish(txn, result).await
    }

    /// Direct children in sibling order.
    pub async fn get_children(&self, id: NodeId) -> Result<Vec<Node>> {
        let mut txn = self.begin(TxnMode::Read).await?;
        let result = self.children_in(txn.as_mut(), id).await;
        self.finish(txn, result).await
    }

    /// Every node below `id`, in pre-order.
    pub async fn get_descendants(&self, id: NodeId) -> Result<Vec<Node>> {
        let mut txn = self.begin(TxnMode::Read).await?;
        let result = self.descendants_in(txn.as_mut(), id).await;
        self.finish(txn, result).await
    }

    /// Number of nodes below `id`.
    pub async fn get_descendant_count(&self, id: NodeId) -> Result<u64> {
        let mut txn = self.begin(TxnMode::Read).await?;
        let result = self.descendant_count_in(txn.as_mut(), id).await;
        self.finish(txn, result).await
    }

    /// Strict ancestors, root first. Empty for a root node.
    pub async fn get_ancestors(&self, id: NodeId) -> Result<Vec<Node>> {
        let mut txn = self.begin(TxnMode::Read).await?;
        let result = self.ancestors_in(txn.as_mut(), id).await;
        self.finish(txn, result).await
    }

    /// Top-level nodes in order.
    pub async fn get_root_nodes(&self) -> Result<Vec<Node>> {
        let mut txn = self.begin(TxnMode::Read).await?;
        let result = self.children_at(txn.as_mut(), "", 0).await;
        self.finish(txn, result).await
    }

    /// The leftmost top-level node.
    pub async fn get_first_root_node(&self) -> Result<Option<Node>> {
        Ok(self.get_root_nodes().await?.into_iter().next())
    }

    /// The rightmost top-level node.
    pub async fn get_last_root_node(&self) -> Result<Option<Node>> {
        Ok(self.get_root_nodes().await?.pop())
    }

    /// True if `id` lies strictly below `other`.
    pub async fn is_descendant_of(&self, id: NodeId, other: NodeId) -> Result<bool> {
        let mut txn = self.begin(TxnMode::Read).await?;
        let result = async {
            let node = self.load(txn.as_mut(), id).await?;
            let other = self.load(txn.as_mut(), other).await?;
            Ok::<_, crate::Error>(node.is_descendant_of(&other))
        }
        .await;
        self.finish(txn, result).await
    }

    /// The parent node, or `None` for a root node.
    pub async fn get_parent(&self, id: NodeId) -> Result<Option<Node>> {
        let mut txn = self.begin(TxnMode::Read).await?;
        let result = self.parent_in(txn.as_mut(), id).await;
        self.finish(txn, result).await
    }

    /// The top-level ancestor of `id` (the node itself if it is a root).
    pub async fn get_root(&self, id: NodeId) -> Result<Node> {
        let mut txn = self.begin(TxnMode::Read).await?;
        let result = self.root_in(txn.as_mut(), id).await;
        self.finish(txn, result).await
    }

    /// All nodes sharing `id`'s parent, `id` included, in order.
    pub async fn get_siblings(&self, id: NodeId) -> Result<Vec<Node>> {
        let mut txn = self.begin(TxnMode::Read).await?;
        let result = self.siblings_in(txn.as_mut(), id).await;
        self.finish(txn, result).await
    }

    /// The leftmost node under `id`'s parent; `id` itself if it is first.
    pub async fn get_first_sibling(&self, id: NodeId) -> Result<Node> {
        let siblings = self.get_siblings(id).await?;
        first_or_missing(siblings.into_iter().next(), id)
    }

    /// The rightmost node under `id`'s parent.
    pub async fn get_last_sibling(&self, id: NodeId) -> Result<Node> {
        let mut siblings = self.get_siblings(id).await?;
        first_or_missing(siblings.pop(), id)
    }

    /// The sibling directly before `id`, if any.
    pub async fn get_prev_sibling(&self, id: NodeId) -> Result<Option<Node>> {
        let siblings = self.get_siblings(id).await?;
        let index = index_of(&siblings, id)?;
        Ok(index.checked_sub(1).map(|i| siblings[i].clone()))
    }

    /// The sibling directly after `id`, if any.
    pub async fn get_next_sibling(&self, id: NodeId) -> Result<Option<Node>> {
        let siblings = self.get_siblings(id).await?;
        let index = index_of(&siblings, id)?;
        Ok(siblings.get(index + 1).cloned())
    }

    /// Leftmost child of `id`.
    pub async fn get_first_child(&self, id: NodeId) -> Result<Option<Node>> {
        Ok(self.get_children(id).await?.into_iter().next())
    }

    /// Rightmost child of `id`.
    pub async fn get_last_child(&self, id: NodeId) -> Result<Option<Node>> {
        Ok(self.get_children(id).await?.pop())
    }

    /// `parent` followed by all its descendants, or the whole forest for
    /// `None`, in pre-order.
    pub async fn get_tree(&self, parent: Option<NodeId>) -> Result<Vec<Node>> {
        let mut txn = self.begin(TxnMode::Read).await?;
        let result = self.tree_in(txn.as_mut(), parent).await;
        self.finish(txn, result).await
    }

    /// Current tree revision. Changes whenever a write transaction commits.
    pub async fn revision(&self) -> Result<u64> {
        let mut txn = self.begin(TxnMode::Read).await?;
        let result = txn.revision().await;
        self.finish(txn, result).await
    }

    async fn children_in(&self, txn: &mut dyn TreeTxn, id: NodeId) -> Result<Vec<Node>> {
        let node = self.load(txn, id).await?;
        self.children_at(txn, node.path(), node.depth()).await
    }

    async fn descendants_in(&self, txn: &mut dyn TreeTxn, id: NodeId) -> Result<Vec<Node>> {
        let node = self.load(txn, id).await?;
        txn.scan(node.path(), None).await
    }

    async fn descendant_count_in(&self, txn: &mut dyn TreeTxn, id: NodeId) -> Result<u64> {
        let node = self.load(txn, id).await?;
        txn.count(node.path()).await
    }

    async fn ancestors_in(&self, txn: &mut dyn TreeTxn, id: NodeId) -> Result<Vec<Node>> {
        let node = self.load(txn, id).await?;
        let paths = self.codec().ancestor_paths(node.path());
        let ancestors = txn.get_by_paths(&paths).await?;
        if ancestors.len() != paths.len() {
            return Err(TreeError::IntegrityViolation {
                reason: format!(
                    "'{}' has {} ancestor rows, expected {}",
                    node.path(),
                    ancestors.len(),
                    paths.len()
                ),
            }
            .into());
        }
        Ok(ancestors)
    }

    async fn parent_in(&self, txn: &mut dyn TreeTxn, id: NodeId) -> Result<Option<Node>> {
        let node = self.load(txn, id).await?;
        self.parent_of(txn, &node).await
    }

    async fn root_in(&self, txn: &mut dyn TreeTxn, id: NodeId) -> Result<Node> {
        let node = self.load(txn, id).await?;
        if node.is_root() {
            return Ok(node);
        }
        let root_path = &node.path()[..self.codec().steplen()];
        txn.get_by_path(root_path).await?.ok_or_else(|| {
            TreeError::IntegrityViolation {
                reason: format!("'{}' has no root row", node.path()),
            }
            .into()
        })
    }

    async fn siblings_in(&self, txn: &mut dyn TreeTxn, id: NodeId) -> Result<Vec<Node>> {
        let node = self.load(txn, id).await?;
        let parent_path = self.codec().parent_path(node.path());
        self.children_at(txn, parent_path, node.depth().saturating_sub(1))
            .await
    }

    async fn tree_in(&self, txn: &mut dyn TreeTxn, parent: Option<NodeId>) -> Result<Vec<Node>> {
        match parent {
            None => txn.scan("", None).await,
            Some(id) => {
                let node = self.load(txn, id).await?;
                let mut nodes = txn.scan(node.path(), None).await?;
                nodes.insert(0, node);
                Ok(nodes)
            }
        }
    }
}

fn index_of(nodes: &[Node], id: NodeId) -> Result<usize> {
    nodes.iter().position(|n| n.id() == id).ok_or_else(|| {
        TreeError::IntegrityViolation {
            reason: format!("node {id} is missing from its sibling list"),
        }
        .into()
    })
}

fn first_or_missing(node: Option<Node>, id: NodeId) -> Result<Node> {
    node.ok_or_else(|| {
        TreeError::IntegrityViolation {
            reason: format!("node {id} has no siblings, not even itself"),
        }
        .into()
    })
}
