//! Request-scoped node cache.
//!
//! A [`NodeCache`] is created at the start of a unit of work (typically one
//! request), answers repeated lookups from memory, and is dropped with it.
//! Entries are tied to the tree revision seen when they were first filled;
//! [`NodeCache::refresh`] discards them once another writer has committed.
//! There is no process-wide cache.

use std::collections::HashMap;

use handle_trait::Handle;

use crate::{
    Result,
    node::{Node, NodeId},
    store::TreeStore,
};

/// Hit and miss counters for one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Memoizing reader over one [`TreeStore`].
///
/// ```
/// # use std::sync::Arc;
/// # use mptree::{TreeStore, TreeConfig, NodeSpec, backend::database::InMemory, cache::NodeCache};
/// # #[tokio::main]
/// # async fn main() -> mptree::Result<()> {
/// # let store = TreeStore::open(Arc::new(InMemory::new()), TreeConfig::default()).await?;
/// let root = store.add_root(NodeSpec::default()).await?;
///
/// let mut cache = NodeCache::new(&store);
/// cache.get(root.id()).await?;
/// cache.get(root.id()).await?;
/// assert_eq!(cache.stats().hits, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct NodeCache {
    store: TreeStore,
    revision: Option<u64>,
    nodes: HashMap<NodeId, Node>,
    children: HashMap<NodeId, Vec<NodeId>>,
    ancestors: HashMap<NodeId, Vec<NodeId>>,
    stats: CacheStats,
}

impl NodeCache {
    pub fn new(store: &TreeStore) -> Self {
        Self {
            store: store.handle(),
            revision: None,
            nodes: HashMap::new(),
            children: HashMap::new(),
            ancestors: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Revision the cached entries belong to, if anything is cached.
    pub fn revision(&self) -> Option<u64> {
        self.revision
    }

    /// Drop every cached entry.
    pub fn clear(&mut self) {
        self.revision = None;
        self.nodes.clear();
        self.children.clear();
        self.ancestors.clear();
    }

    /// Clear the cache if the tree changed since it was filled. Returns
    /// whether anything was discarded.
    pub async fn refresh(&mut self) -> Result<bool> {
        let Some(seen) = self.revision else {
            return Ok(false);
        };
        let current = self.store.revision().await?;
        if current == seen {
            return Ok(false);
        }
        tracing::debug!(
            tree = %self.store.name(),
            seen,
            current,
            "Tree changed, clearing node cache"
        );
        self.clear();
        Ok(true)
    }

    /// Cached [`TreeStore::get`].
    pub async fn get(&mut self, id: NodeId) -> Result<Node> {
        if let Some(node) = self.nodes.get(&id) {
            self.stats.hits += 1;
            return Ok(node.clone());
        }
        self.stats.misses += 1;
        self.pin_revision().await?;
        let node = self.store.get(id).await?;
        self.nodes.insert(id, node.clone());
        Ok(node)
    }

    /// Cached [`TreeStore::get_children`].
    pub async fn get_children(&mut self, id: NodeId) -> Result<Vec<Node>> {
        if let Some(nodes) = self.lookup(self.children.get(&id)) {
            self.stats.hits += 1;
            return Ok(nodes);
        }
        self.stats.misses += 1;
        self.pin_revision().await?;
        let children = self.store.get_children(id).await?;
        self.remember(&children);
        self.children
            .insert(id, children.iter().map(Node::id).collect());
        Ok(children)
    }

    /// Cached [`TreeStore::get_ancestors`].
    pub async fn get_ancestors(&mut self, id: NodeId) -> Result<Vec<Node>> {
        if let Some(nodes) = self.lookup(self.ancestors.get(&id)) {
            self.stats.hits += 1;
            return Ok(nodes);
        }
        self.stats.misses += 1;
        self.pin_revision().await?;
        let ancestors = self.store.get_ancestors(id).await?;
        self.remember(&ancestors);
        self.ancestors
            .insert(id, ancestors.iter().map(Node::id).collect());
        Ok(ancestors)
    }

    async fn pin_revision(&mut self) -> Result<()> {
        if self.revision.is_none() {
            self.revision = Some(self.store.revision().await?);
        }
        Ok(())
    }

    fn remember(&mut self, nodes: &[Node]) {
        for node in nodes {
            self.nodes.insert(node.id(), node.clone());
        }
    }

    /// Resolve cached ids; `None` if the list or any node is missing.
    fn lookup(&self, ids: Option<&Vec<NodeId>>) -> Option<Vec<Node>> {
        ids?.iter().map(|id| self.nodes.get(id).cloned()).collect()
    }
}
