//! Nested import and export.
//!
//! [`BulkNode`] is the nested JSON shape used to move whole subtrees in and
//! out of a store, e.g. for fixtures, backups or copying between trees.

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    backend::{TreeTxn, TxnMode},
    constants::DEFAULT_KIND,
    node::{Node, NodeId, NodeSpec},
};

use super::TreeStore;

/// One node with its children, in sibling order.
///
/// ```
/// use mptree::store::BulkNode;
///
/// let nodes: Vec<BulkNode> = serde_json::from_str(r#"[
///     {"kind": "collection", "data": {"title": "Docs"}, "children": [
///         {"data": {"title": "Intro"}}
///     ]}
/// ]"#).unwrap();
/// assert_eq!(nodes[0].children[0].kind, "node");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkNode {
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
    /// Reused on load when present; a fresh id is generated otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BulkNode>,
}

fn default_kind() -> String {
    DEFAULT_KIND.to_string()
}

impl BulkNode {
    pub fn new(kind: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            data,
            id: None,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: BulkNode) -> Self {
        self.children.push(child);
        self
    }

    /// Drop stored ids here and below, so the structure can be loaded next to
    /// the tree it was dumped from.
    pub fn without_ids(mut self) -> Self {
        self.id = None;
        self.children = self.children.into_iter().map(Self::without_ids).collect();
        self
    }

    /// Number of nodes in this subtree, itself included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(BulkNode::node_count).sum::<usize>()
    }

    fn spec(&self) -> NodeSpec {
        NodeSpec {
            id: self.id,
            kind: self.kind.clone(),
            data: self.data.clone(),
        }
    }
}

impl From<Node> for BulkNode {
    fn from(node: Node) -> Self {
        Self {
            kind: node.kind().to_string(),
            data: node.data().clone(),
            id: Some(node.id()),
            children: Vec::new(),
        }
    }
}

/// Rebuild nesting from a pre-ordered node list.
fn nest(nodes: Vec<Node>) -> Vec<BulkNode> {
    let mut roots = Vec::new();
    let mut open: Vec<(usize, BulkNode)> = Vec::new();
    for node in nodes {
        let depth = node.depth();
        close_to(&mut open, &mut roots, depth);
        open.push((depth, BulkNode::from(node)));
    }
    close_to(&mut open, &mut roots, 0);
    roots
}

/// Close every open node at `depth` or deeper, attaching each to the one
/// below it on the stack.
fn close_to(open: &mut Vec<(usize, BulkNode)>, roots: &mut Vec<BulkNode>, depth: usize) {
    while open.last().is_some_and(|(d, _)| *d >= depth) {
        let Some((_, done)) = open.pop() else { break };
        match open.last_mut() {
            Some((_, parent)) => parent.children.push(done),
            None => roots.push(done),
        }
    }
}

impl TreeStore {
    /// Export `parent` and its subtree (or the whole forest) as nested nodes.
    pub async fn dump_bulk(&self, parent: Option<NodeId>) -> Result<Vec<BulkNode>> {
        let nodes = self.get_tree(parent).await?;
        Ok(nest(nodes))
    }

    /// Insert nested nodes as the last children of `parent` (or as the last
    /// root nodes), in one transaction. Returns the new ids in pre-order.
    pub async fn load_bulk(
        &self,
        parent: Option<NodeId>,
        nodes: Vec<BulkNode>,
    ) -> Result<Vec<NodeId>> {
        let mut txn = self.begin(TxnMode::Write).await?;
        let result = self.load_bulk_in(txn.as_mut(), parent, nodes).await;
        self.finish(txn, result).await
    }

    async fn load_bulk_in(
        &self,
        txn: &mut dyn TreeTxn,
        parent: Option<NodeId>,
        nodes: Vec<BulkNode>,
    ) -> Result<Vec<NodeId>> {
        let total: usize = nodes.iter().map(BulkNode::node_count).sum();
        let mut created = Vec::with_capacity(total);

        // Depth-first with an explicit stack; siblings are pushed in reverse
        // so each is appended after the previous one's subtree is done.
        let mut pending: Vec<(Option<NodeId>, BulkNode)> =
            nodes.into_iter().rev().map(|n| (parent, n)).collect();
        while let Some((parent_id, mut bulk)) = pending.pop() {
            let parent_node = match parent_id {
                Some(id) => Some(self.load(txn, id).await?),
                None => None,
            };
            let node = self.insert_last(txn, parent_node, bulk.spec()).await?;
            created.push(node.id());
            let children = std::mem::take(&mut bulk.children);
            pending.extend(children.into_iter().rev().map(|c| (Some(node.id()), c)));
        }

        tracing::debug!(tree = %self.name(), count = created.len(), "Loaded bulk nodes");
        Ok(created)
    }
}
