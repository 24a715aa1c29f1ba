//! Tree node model.
//!
//! A [`Node`] is one row of a tree table: the shape columns owned by the store
//! (`path`, `depth`, `numchild`) plus a kind tag and an opaque JSON payload
//! owned by collaborators.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DEFAULT_KIND;

/// Stable node identifier, independent of the node's position in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for NodeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One stored node.
///
/// Values returned by the store are snapshots: a later structural edit can
/// renumber the node, so operations always take a [`NodeId`] and re-read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    path: String,
    depth: usize,
    numchild: u64,
    kind: String,
    data: serde_json::Value,
}

impl Node {
    pub(crate) fn from_parts(
        id: NodeId,
        path: String,
        depth: usize,
        numchild: u64,
        kind: String,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id,
            path,
            depth,
            numchild,
            kind,
            data,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn numchild(&self) -> u64 {
        self.numchild
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn data(&self) -> &serde_json::Value {
        &self.data
    }

    pub(crate) fn set_path(&mut self, path: String, depth: usize) {
        self.path = path;
        self.depth = depth;
    }

    pub(crate) fn set_numchild(&mut self, numchild: u64) {
        self.numchild = numchild;
    }

    pub(crate) fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
    }

    pub(crate) fn set_data(&mut self, data: serde_json::Value) {
        self.data = data;
    }

    pub fn is_root(&self) -> bool {
        self.depth == 1
    }

    pub fn is_leaf(&self) -> bool {
        self.numchild == 0
    }

    /// True if `self` lies strictly below `other`.
    pub fn is_descendant_of(&self, other: &Node) -> bool {
        self.path.len() > other.path.len() && self.path.starts_with(&other.path)
    }

    /// True if `other` is the direct parent of `self`.
    pub fn is_child_of(&self, other: &Node) -> bool {
        self.depth == other.depth + 1 && self.is_descendant_of(other)
    }

    /// True if both nodes share a parent (root nodes are siblings of each
    /// other). A node counts as its own sibling.
    pub fn is_sibling_of(&self, other: &Node) -> bool {
        if self.depth != other.depth || self.path.len() != other.path.len() {
            return false;
        }
        let parent_len = self.path.len() - self.path.len() / self.depth.max(1);
        self.path[..parent_len] == other.path[..parent_len]
    }
}

/// Payload for a node that is about to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Explicit identifier; a fresh one is generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    /// Kind tag, checked against the kind registry when one is configured.
    #[serde(default = "default_kind")]
    pub kind: String,
    /// Collaborator-owned payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

fn default_kind() -> String {
    DEFAULT_KIND.to_string()
}

impl NodeSpec {
    /// A node of the default kind carrying `data`.
    pub fn new(data: serde_json::Value) -> Self {
        Self {
            id: None,
            kind: default_kind(),
            data,
        }
    }

    /// A node of `kind` with a null payload.
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self {
            id: None,
            kind: kind.into(),
            data: serde_json::Value::Null,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = Some(id);
        self
    }

    pub(crate) fn into_node(self, path: String, depth: usize) -> Node {
        Node::from_parts(
            self.id.unwrap_or_default(),
            path,
            depth,
            0,
            self.kind,
            self.data,
        )
    }
}

impl Default for NodeSpec {
    fn default() -> Self {
        Self::new(serde_json::Value::Null)
    }
}
