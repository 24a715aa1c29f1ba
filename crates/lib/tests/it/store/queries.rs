use mptree::NodeId;

use crate::helpers::*;

/// root
/// ├── a
/// │   ├── a1
/// │   │   └── a1x
/// │   └── a2
/// └── b
async fn sample() -> (mptree::TreeStore, Vec<mptree::Node>) {
    let store = test_store().await;
    let (root, children) = root_with_children(&store, &["a", "b"]).await;
    let a1 = store.add_child(children[0].id(), page("a1")).await.unwrap();
    let a1x = store.add_child(a1.id(), page("a1x")).await.unwrap();
    let a2 = store.add_child(children[0].id(), page("a2")).await.unwrap();
    let nodes = vec![
        root,
        children[0].clone(),
        a1,
        a1x,
        a2,
        children[1].clone(),
    ];
    (store, nodes)
}

#[tokio::test]
async fn test_descendants_are_pre_ordered() {
    let (store, nodes) = sample().await;
    let root = &nodes[0];

    let descendants = store.get_descendants(root.id()).await.unwrap();
    assert_eq!(titles(&descendants), ["a", "a1", "a1x", "a2", "b"]);
    assert_eq!(store.get_descendant_count(root.id()).await.unwrap(), 5);
    assert_eq!(store.get_descendant_count(nodes[5].id()).await.unwrap(), 0);

    let subtree = store.get_tree(Some(nodes[1].id())).await.unwrap();
    assert_eq!(titles(&subtree), ["a", "a1", "a1x", "a2"]);
    let whole = store.get_tree(None).await.unwrap();
    assert_eq!(whole.len(), 6);
}

#[tokio::test]
async fn test_ancestors_and_root() {
    let (store, nodes) = sample().await;
    let a1x = nodes[3].id();

    let ancestors = store.get_ancestors(a1x).await.unwrap();
    assert_eq!(titles(&ancestors), ["root", "a", "a1"]);
    assert!(store.get_ancestors(nodes[0].id()).await.unwrap().is_empty());

    assert_eq!(store.get_root(a1x).await.unwrap().id(), nodes[0].id());
    assert_eq!(store.get_root(nodes[0].id()).await.unwrap().id(), nodes[0].id());
    assert_eq!(
        store.get_parent(a1x).await.unwrap().map(|p| p.id()),
        Some(nodes[2].id())
    );
    assert!(store.get_parent(nodes[0].id()).await.unwrap().is_none());

    assert!(store.is_descendant_of(a1x, nodes[1].id()).await.unwrap());
    assert!(!store.is_descendant_of(nodes[1].id(), a1x).await.unwrap());
    assert!(!store.is_descendant_of(a1x, a1x).await.unwrap());
}

#[tokio::test]
async fn test_sibling_navigation() {
    let (store, nodes) = sample().await;
    let (a1, a2) = (nodes[2].id(), nodes[4].id());

    assert_eq!(titles(&store.get_siblings(a1).await.unwrap()), ["a1", "a2"]);
    assert_eq!(title(&store.get_first_sibling(a2).await.unwrap()), "a1");
    assert_eq!(title(&store.get_last_sibling(a1).await.unwrap()), "a2");
    assert!(store.get_prev_sibling(a1).await.unwrap().is_none());
    assert_eq!(
        store.get_next_sibling(a1).await.unwrap().map(|n| n.id()),
        Some(a2)
    );
    assert_eq!(
        store.get_prev_sibling(a2).await.unwrap().map(|n| n.id()),
        Some(a1)
    );
    assert!(store.get_next_sibling(a2).await.unwrap().is_none());

    // Root-level siblings are the other roots.
    let other = store.add_root(page("other")).await.unwrap();
    assert_eq!(
        titles(&store.get_siblings(nodes[0].id()).await.unwrap()),
        ["root", "other"]
    );
    assert_eq!(
        store.get_last_root_node().await.unwrap().map(|n| n.id()),
        Some(other.id())
    );
    assert_eq!(
        store.get_first_root_node().await.unwrap().map(|n| n.id()),
        Some(nodes[0].id())
    );
}

#[tokio::test]
async fn test_first_and_last_child() {
    let (store, nodes) = sample().await;
    let a = nodes[1].id();

    assert_eq!(title(&store.get_first_child(a).await.unwrap().unwrap()), "a1");
    assert_eq!(title(&store.get_last_child(a).await.unwrap().unwrap()), "a2");
    assert!(store.get_first_child(nodes[5].id()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_by_path() {
    let (store, nodes) = sample().await;
    let a1x = store.get(nodes[3].id()).await.unwrap();

    assert_eq!(store.get_by_path(a1x.path()).await.unwrap(), a1x);

    let err = store.get_by_path("ZZZZ").await.unwrap_err();
    assert!(err.is_not_found(), "{err}");
    // Not a whole number of segments.
    assert!(store.get_by_path("000").await.is_err());
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let (store, _) = sample().await;
    let missing = NodeId::new();

    assert!(store.get(missing).await.unwrap_err().is_not_found());
    assert!(store.get_children(missing).await.unwrap_err().is_not_found());
    assert!(store.get_ancestors(missing).await.unwrap_err().is_not_found());
    assert!(store.get_siblings(missing).await.unwrap_err().is_not_found());
    assert!(store.get_tree(Some(missing)).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_empty_tree() {
    let store = test_store().await;
    assert!(store.get_root_nodes().await.unwrap().is_empty());
    assert!(store.get_first_root_node().await.unwrap().is_none());
    assert!(store.get_tree(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_trees_in_one_backend_are_separate() {
    let backend = test_backend().await;
    let pages = mptree::TreeStore::open(backend.clone(), mptree::TreeConfig::named("pages"))
        .await
        .unwrap();
    let menus = mptree::TreeStore::open(backend.clone(), mptree::TreeConfig::named("menus"))
        .await
        .unwrap();

    pages.add_root(page("home")).await.unwrap();
    assert!(menus.get_root_nodes().await.unwrap().is_empty());
    let trees = backend.list_trees().await.unwrap();
    assert!(trees.contains(&"pages".to_string()));
    assert!(trees.contains(&"menus".to_string()));
}
