//! Shared helpers for benchmark tests

use std::sync::Arc;

use mptree::{
    NodeId, NodeSpec, TreeConfig, TreeStore,
    backend::{BackendImpl, database::InMemory},
};

/// Creates a test backend based on TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory backend (default)
/// - "sqlite": SQLite in-memory backend (requires `sqlite` feature)
///
/// This mirrors the pattern used in integration tests for consistency.
async fn test_backend() -> Arc<dyn BackendImpl> {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                use mptree::backend::database::Sqlite;
                Arc::new(
                    Sqlite::sqlite_in_memory()
                        .await
                        .expect("Failed to create SQLite backend"),
                )
            }
            #[cfg(not(feature = "sqlite"))]
            {
                panic!("TEST_BACKEND=sqlite requires the 'sqlite' feature to be enabled")
            }
        }
        _ => Arc::new(InMemory::new()),
    }
}

/// Opens an empty tree with the default encoding.
pub async fn setup_store_async() -> TreeStore {
    TreeStore::open(test_backend().await, TreeConfig::default())
        .await
        .expect("Failed to open tree store")
}

/// Creates a root with `children` children, each holding `grandchildren`
/// leaves. Returns the store, the root and the child ids in order.
pub async fn setup_wide_tree_async(
    children: usize,
    grandchildren: usize,
) -> (TreeStore, NodeId, Vec<NodeId>) {
    let store = setup_store_async().await;
    let root = store
        .add_root(NodeSpec::default())
        .await
        .expect("Failed to add root");
    let mut ids = Vec::with_capacity(children);
    for _ in 0..children {
        let child = store
            .add_child(root.id(), NodeSpec::default())
            .await
            .expect("Failed to add child");
        for _ in 0..grandchildren {
            store
                .add_child(child.id(), NodeSpec::default())
                .await
                .expect("Failed to add grandchild");
        }
        ids.push(child.id());
    }
    (store, root.id(), ids)
}
