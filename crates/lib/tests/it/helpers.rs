use std::sync::Arc;

use mptree::{
    Node, NodeId, NodeSpec, TreeConfig, TreeStore,
    backend::{BackendImpl, database::InMemory},
};
use serde_json::json;

// ==========================
// CORE TEST FACTORIES
// ==========================
// Single point of change for backend matrix testing via the TEST_BACKEND env var.

/// Creates a test backend based on TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory backend (default)
/// - "sqlite": SQLite in-memory backend (requires `sqlite` feature)
/// - "postgres": PostgreSQL backend in a throwaway schema (requires
///   `postgres` feature and TEST_POSTGRES_URL)
///
/// ```bash
/// TEST_BACKEND=sqlite cargo test --features sqlite
/// TEST_BACKEND=postgres TEST_POSTGRES_URL="postgres://localhost/mptree_test" \
///   cargo test --features postgres
/// ```
pub async fn test_backend() -> Arc<dyn BackendImpl> {
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
        Ok("postgres") => {
            #[cfg(feature = "postgres")]
            {
                use mptree::backend::database::Postgres;
                let url = std::env::var("TEST_POSTGRES_URL")
                    .unwrap_or_else(|_| "postgres://localhost/mptree_test".to_string());
                Arc::new(
                    Postgres::connect_postgres_isolated(&url)
                        .await
                        .expect("Failed to connect to PostgreSQL"),
                )
            }
            #[cfg(not(feature = "postgres"))]
            {
                panic!("TEST_BACKEND=postgres requires the 'postgres' feature to be enabled")
            }
        }
        _ => Arc::new(InMemory::new()),
    }
}

/// Store on a fresh backend with the default encoding.
pub async fn test_store() -> TreeStore {
    test_store_with(TreeConfig::default()).await
}

pub async fn test_store_with(config: TreeConfig) -> TreeStore {
    TreeStore::open(test_backend().await, config)
        .await
        .expect("Failed to open tree store")
}

/// Tiny encoding: binary alphabet, two characters per segment, so four
/// children per level.
pub fn tiny_config() -> TreeConfig {
    TreeConfig::named("tiny").with_alphabet("01").with_steplen(2)
}

// ==========================
// NODE HELPERS
// ==========================

pub fn page(title: &str) -> NodeSpec {
    NodeSpec::of_kind("page").with_data(json!({ "title": title }))
}

pub fn title(node: &Node) -> &str {
    node.data()["title"].as_str().unwrap_or("")
}

pub fn titles(nodes: &[Node]) -> Vec<&str> {
    nodes.iter().map(title).collect()
}

pub fn ids(nodes: &[Node]) -> Vec<NodeId> {
    nodes.iter().map(Node::id).collect()
}

/// Root with one child per title, in order.
pub async fn root_with_children(store: &TreeStore, children: &[&str]) -> (Node, Vec<Node>) {
    let root = store.add_root(page("root")).await.unwrap();
    let mut created = Vec::with_capacity(children.len());
    for child in children {
        created.push(store.add_child(root.id(), page(child)).await.unwrap());
    }
    (root, created)
}

// ==========================
// ASSERTIONS
// ==========================

/// The stored tree satisfies every structural invariant.
pub async fn assert_consistent(store: &TreeStore) {
    let problems = store.find_problems().await.unwrap();
    assert!(problems.is_empty(), "tree has problems: {problems:?}");

    let nodes = store.get_tree(None).await.unwrap();
    let paths: Vec<&str> = nodes.iter().map(Node::path).collect();
    let mut sorted = paths.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(paths, sorted, "paths are not unique and ordered");
}
