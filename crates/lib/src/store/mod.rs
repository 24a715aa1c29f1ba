//! Tree operations over a storage backend.
//!
//! [`TreeStore`] is the only component that understands tree shape. Backends
//! store flat rows; the store turns every structural edit into a short
//! sequence of range primitives inside one transaction:
//!
//! - insert: plan a free sibling slot ([`slots`]), shift subtrees out of the
//!   way if needed, insert the row, bump the parent's `numchild`
//! - move: park the subtree under the reserved prefix, plan the destination
//!   slot, relocate the subtree there, fix both parents' `numchild`
//! - delete: drop the subtree's key range, decrement the parent's `numchild`
//!
//! Operations address nodes by [`NodeId`] and re-read them inside the
//! transaction, so a caller holding an outdated [`Node`] copy can never
//! corrupt the tree. Any error rolls the transaction back.

use std::{fmt, sync::Arc};

use handle_trait::Handle;

use crate::{
    Result,
    backend::{BackendImpl, TreeTxn, TxnMode},
    config::TreeConfig,
    node::{Node, NodeId},
    path::PathCodec,
    registry::KindRegistry,
};

mod bulk;
mod check;
pub mod errors;
mod mutate;
mod query;
pub(crate) mod slots;

pub use bulk::BulkNode;
pub use check::{RepairReport, TreeProblems};
pub use errors::TreeError;

struct TreeStoreInner {
    backend: Arc<dyn BackendImpl>,
    config: TreeConfig,
    codec: PathCodec,
    registry: Option<KindRegistry>,
}

/// Handle to one tree in a backend.
///
/// Cloning is cheap and every clone addresses the same tree. Several stores
/// (for different trees) can share one backend.
///
/// ```
/// # use std::sync::Arc;
/// # use mptree::{TreeStore, TreeConfig, NodeSpec, Position, backend::database::InMemory};
/// # #[tokio::main]
/// # async fn main() -> mptree::Result<()> {
/// let store = TreeStore::open(Arc::new(InMemory::new()), TreeConfig::named("pages")).await?;
///
/// let home = store.add_root(NodeSpec::new(serde_json::json!({"title": "Home"}))).await?;
/// let about = store.add_child(home.id(), NodeSpec::default()).await?;
/// let news = store.add_sibling(about.id(), Position::Left, NodeSpec::default()).await?;
///
/// let children = store.get_children(home.id()).await?;
/// assert_eq!(children[0].id(), news.id());
/// assert_eq!(children[1].id(), about.id());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Handle)]
pub struct TreeStore {
    inner: Arc<TreeStoreInner>,
}

impl fmt::Debug for TreeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeStore")
            .field("tree", &self.inner.config.name)
            .field("alphabet", &self.inner.codec.alphabet())
            .field("steplen", &self.inner.codec.steplen())
            .field("registry", &self.inner.registry.is_some())
            .finish()
    }
}

impl TreeStore {
    /// Open (creating if needed) the tree named in `config`.
    ///
    /// # Errors
    /// Configuration errors for an invalid alphabet, steplen or name, and any
    /// backend error from creating the tree.
    pub async fn open(backend: Arc<dyn BackendImpl>, config: TreeConfig) -> Result<Self> {
        Self::open_inner(backend, config, None).await
    }

    /// Like [`TreeStore::open`], validating node kinds against `registry` on
    /// every insert and move.
    pub async fn open_with_registry(
        backend: Arc<dyn BackendImpl>,
        config: TreeConfig,
        registry: KindRegistry,
    ) -> Result<Self> {
        Self::open_inner(backend, config, Some(registry)).await
    }

    async fn open_inner(
        backend: Arc<dyn BackendImpl>,
        config: TreeConfig,
        registry: Option<KindRegistry>,
    ) -> Result<Self> {
        config.validate()?;
        let codec = config.codec()?;
        backend.ensure_tree(&config.name).await?;
        tracing::debug!(
            tree = %config.name,
            alphabet = %codec.alphabet(),
            steplen = codec.steplen(),
            "Opened tree store"
        );
        Ok(Self {
            inner: Arc::new(TreeStoreInner {
                backend,
                config,
                codec,
                registry,
            }),
        })
    }

    /// Name of the tree this store addresses.
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &TreeConfig {
        &self.inner.config
    }

    pub fn codec(&self) -> &PathCodec {
        &self.inner.codec
    }

    pub fn registry(&self) -> Option<&KindRegistry> {
        self.inner.registry.as_ref()
    }

    /// The shared backend, e.g. for downcasting via `as_any`.
    pub fn backend(&self) -> &Arc<dyn BackendImpl> {
        &self.inner.backend
    }

    async fn begin(&self, mode: TxnMode) -> Result<Box<dyn TreeTxn>> {
        self.inner.backend.begin(self.name(), mode).await
    }

    /// Commit on success, roll back on failure.
    async fn finish<T>(&self, txn: Box<dyn TreeTxn>, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                txn.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::warn!(
                        tree = %self.name(),
                        error = %rollback_err,
                        "Rollback failed after error"
                    );
                }
                Err(err)
            }
        }
    }

    async fn load(&self, txn: &mut dyn TreeTxn, id: NodeId) -> Result<Node> {
        txn.get(&id)
            .await?
            .ok_or_else(|| TreeError::NodeNotFound { id }.into())
    }

    /// The parent of `node`, or `None` at the root level.
    async fn parent_of(&self, txn: &mut dyn TreeTxn, node: &Node) -> Result<Option<Node>> {
        if node.depth() <= 1 {
            return Ok(None);
        }
        let parent_path = self.codec().parent_path(node.path());
        match txn.get_by_path(parent_path).await? {
            Some(parent) => Ok(Some(parent)),
            None => Err(TreeError::IntegrityViolation {
                reason: format!("node at '{}' has no parent row", node.path()),
            }
            .into()),
        }
    }

    /// Children of the node at `parent_path` (the root level for `""`).
    async fn children_at(
        &self,
        txn: &mut dyn TreeTxn,
        parent_path: &str,
        parent_depth: usize,
    ) -> Result<Vec<Node>> {
        txn.scan(parent_path, Some(parent_depth + 1)).await
    }

    fn check_kind(&self, kind: &str, parent: Option<&Node>) -> Result<()> {
        if let Some(registry) = self.registry() {
            registry.check(kind, parent.map(Node::kind))?;
        }
        Ok(())
    }
}
