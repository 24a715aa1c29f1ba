use mptree::{NodeSpec, Position};
use serde_json::json;

use crate::helpers::*;

#[tokio::test]
async fn test_roots_are_appended_in_order() {
    let store = test_store().await;
    let a = store.add_root(page("a")).await.unwrap();
    let b = store.add_root(page("b")).await.unwrap();

    assert_eq!(a.path(), "0000");
    assert_eq!(b.path(), "0001");
    assert_eq!(a.depth(), 1);
    assert!(a.is_root());

    let roots = store.get_root_nodes().await.unwrap();
    assert_eq!(titles(&roots), ["a", "b"]);
}

#[tokio::test]
async fn test_add_child_appends_and_counts() {
    let store = test_store().await;
    let (root, children) = root_with_children(&store, &["a", "b", "c"]).await;

    assert_eq!(children[0].path(), "00000000");
    assert_eq!(children[2].path(), "00000002");
    assert!(children.iter().all(|c| c.depth() == 2));

    let root = store.get(root.id()).await.unwrap();
    assert_eq!(root.numchild(), 3);
    assert!(!root.is_leaf());
    assert_eq!(
        titles(&store.get_children(root.id()).await.unwrap()),
        ["a", "b", "c"]
    );
    assert_consistent(&store).await;
}

#[tokio::test]
async fn test_insert_left_renumbers_following_siblings() {
    let store = test_store().await;
    let (root, children) = root_with_children(&store, &["a", "b", "c"]).await;
    let (b, c) = (&children[1], &children[2]);
    let grandchild = store.add_child(c.id(), page("c1")).await.unwrap();

    let d = store
        .add_sibling(b.id(), Position::Left, page("d"))
        .await
        .unwrap();

    assert_eq!(
        titles(&store.get_children(root.id()).await.unwrap()),
        ["a", "d", "b", "c"]
    );
    // C moved, and its child moved with it.
    let c_after = store.get(c.id()).await.unwrap();
    assert_ne!(c_after.path(), c.path());
    let grandchild_after = store.get(grandchild.id()).await.unwrap();
    assert!(grandchild_after.path().starts_with(c_after.path()));
    assert_eq!(
        store.get_parent(grandchild.id()).await.unwrap().unwrap().id(),
        c.id()
    );
    assert_eq!(store.get(d.id()).await.unwrap().depth(), 2);
    assert_eq!(store.get(root.id()).await.unwrap().numchild(), 4);
    assert_consistent(&store).await;
}

#[tokio::test]
async fn test_add_sibling_positions() {
    let store = test_store().await;
    let (root, children) = root_with_children(&store, &["b", "c"]).await;
    let b = &children[0];

    store
        .add_sibling(b.id(), Position::FirstSibling, page("first"))
        .await
        .unwrap();
    store
        .add_sibling(b.id(), Position::Right, page("after-b"))
        .await
        .unwrap();
    store
        .add_sibling(b.id(), Position::LastSibling, page("last"))
        .await
        .unwrap();

    assert_eq!(
        titles(&store.get_children(root.id()).await.unwrap()),
        ["first", "b", "after-b", "c", "last"]
    );
    assert_consistent(&store).await;
}

#[tokio::test]
async fn test_add_sibling_of_root() {
    let store = test_store().await;
    let a = store.add_root(page("a")).await.unwrap();
    let b = store
        .add_sibling(a.id(), Position::Left, page("b"))
        .await
        .unwrap();

    assert!(b.is_root());
    assert_eq!(
        titles(&store.get_root_nodes().await.unwrap()),
        ["b", "a"]
    );
}

#[tokio::test]
async fn test_add_sibling_rejects_child_positions() {
    let store = test_store().await;
    let (root, children) = root_with_children(&store, &["a"]).await;

    for position in [Position::FirstChild, Position::LastChild] {
        let err = store
            .add_sibling(children[0].id(), position, page("x"))
            .await
            .unwrap_err();
        assert!(err.is_invalid_position(), "{err}");
    }
    assert_eq!(store.get(root.id()).await.unwrap().numchild(), 1);
}

#[tokio::test]
async fn test_missing_parent_is_not_found() {
    let store = test_store().await;
    let err = store
        .add_child(mptree::NodeId::new(), page("x"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(store.get_tree(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_capacity_boundary() {
    let store = test_store_with(tiny_config()).await;
    let root = store.add_root(NodeSpec::default()).await.unwrap();

    for _ in 0..4 {
        store.add_child(root.id(), NodeSpec::default()).await.unwrap();
    }
    let err = store
        .add_child(root.id(), NodeSpec::default())
        .await
        .unwrap_err();
    assert!(err.is_path_overflow(), "{err}");

    let root = store.get(root.id()).await.unwrap();
    assert_eq!(root.numchild(), 4);
    assert_consistent(&store).await;
}

#[tokio::test]
async fn test_root_level_overflow() {
    let store = test_store_with(tiny_config()).await;
    for _ in 0..4 {
        store.add_root(NodeSpec::default()).await.unwrap();
    }
    let err = store.add_root(NodeSpec::default()).await.unwrap_err();
    assert!(err.is_path_overflow());
}

#[tokio::test]
async fn test_freed_slots_are_reused_by_compaction() {
    let store = test_store_with(tiny_config()).await;
    let root = store.add_root(NodeSpec::default()).await.unwrap();
    let mut children = Vec::new();
    for i in 0..4 {
        children.push(store.add_child(root.id(), page(&i.to_string())).await.unwrap());
    }
    store.delete(children[0].id()).await.unwrap();

    // The tail slot is taken; appending compacts the survivors downward.
    store.add_child(root.id(), page("4")).await.unwrap();
    assert_eq!(
        titles(&store.get_children(root.id()).await.unwrap()),
        ["1", "2", "3", "4"]
    );
    assert_consistent(&store).await;
}

#[tokio::test]
async fn test_explicit_id_is_kept() {
    let store = test_store().await;
    let id = mptree::NodeId::new();
    let node = store
        .add_root(NodeSpec::new(json!({"x": 1})).with_id(id))
        .await
        .unwrap();
    assert_eq!(node.id(), id);
    assert_eq!(node.kind(), "node");

    let err = store
        .add_root(NodeSpec::default().with_id(id))
        .await
        .unwrap_err();
    assert!(err.is_integrity_error(), "{err}");
}

#[tokio::test]
async fn test_update_data_leaves_shape_alone() {
    let store = test_store().await;
    let (root, children) = root_with_children(&store, &["a"]).await;

    let updated = store
        .update_data(children[0].id(), json!({"title": "renamed"}))
        .await
        .unwrap();
    assert_eq!(title(&updated), "renamed");
    assert_eq!(updated.path(), children[0].path());

    let reloaded = store.get(children[0].id()).await.unwrap();
    assert_eq!(reloaded, updated);
    assert_eq!(store.get(root.id()).await.unwrap().numchild(), 1);
}

#[tokio::test]
async fn test_delete_removes_subtree() {
    let store = test_store().await;
    let (root, children) = root_with_children(&store, &["a", "b"]).await;
    store.add_child(children[0].id(), page("a1")).await.unwrap();
    store.add_child(children[0].id(), page("a2")).await.unwrap();

    let removed = store.delete(children[0].id()).await.unwrap();
    assert_eq!(removed, 3);

    assert_eq!(titles(&store.get_children(root.id()).await.unwrap()), ["b"]);
    assert_eq!(store.get(root.id()).await.unwrap().numchild(), 1);
    assert!(store.get(children[0].id()).await.unwrap_err().is_not_found());
    assert_eq!(store.get_descendant_count(root.id()).await.unwrap(), 1);
    assert_consistent(&store).await;
}
