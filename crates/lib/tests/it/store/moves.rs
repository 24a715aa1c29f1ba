use mptree::{NodeId, NodeSpec, Position, TreeStore};

use crate::helpers::*;

#[tokio::test]
async fn test_reorder_then_move_into_sibling() {
    let store = test_store().await;
    let (root, children) = root_with_children(&store, &["a", "b", "c"]).await;
    let (b, c) = (children[1].id(), children[2].id());
    store
        .add_sibling(b, Position::Left, page("d"))
        .await
        .unwrap();

    store.move_node(b, c, Position::FirstChild).await.unwrap();

    assert_eq!(
        titles(&store.get_children(root.id()).await.unwrap()),
        ["a", "d", "c"]
    );
    assert_eq!(ids(&store.get_children(c).await.unwrap()), [b]);
    assert_eq!(store.get(root.id()).await.unwrap().numchild(), 3);
    assert_eq!(store.get(c).await.unwrap().numchild(), 1);
    assert_eq!(store.get(b).await.unwrap().depth(), 3);

    let err = store
        .move_node(c, b, Position::FirstChild)
        .await
        .unwrap_err();
    assert!(err.is_invalid_move(), "{err}");
    assert_consistent(&store).await;
}

#[tokio::test]
async fn test_move_into_own_subtree_is_rejected_without_changes() {
    let store = test_store().await;
    let (_, children) = root_with_children(&store, &["a"]).await;
    let a = children[0].id();
    let a1 = store.add_child(a, page("a1")).await.unwrap();
    let before = store.get_tree(None).await.unwrap();
    let revision = store.revision().await.unwrap();

    for position in Position::ALL {
        let err = store.move_node(a, a1.id(), position).await.unwrap_err();
        assert!(err.is_invalid_move(), "{position}: {err}");
    }
    for position in [Position::FirstChild, Position::LastChild] {
        let err = store.move_node(a, a, position).await.unwrap_err();
        assert!(err.is_invalid_move(), "{position}: {err}");
    }

    assert_eq!(store.get_tree(None).await.unwrap(), before);
    assert_eq!(store.revision().await.unwrap(), revision);
}

#[tokio::test]
async fn test_move_next_to_itself_is_a_no_op() {
    let store = test_store().await;
    let (root, children) = root_with_children(&store, &["a", "b"]).await;
    let before = store.get_tree(None).await.unwrap();

    store
        .move_node(children[0].id(), children[0].id(), Position::Right)
        .await
        .unwrap();
    store
        .move_node(children[1].id(), children[1].id(), Position::Left)
        .await
        .unwrap();

    assert_eq!(store.get_tree(None).await.unwrap(), before);
    assert_eq!(store.get(root.id()).await.unwrap().numchild(), 2);
}

#[tokio::test]
async fn test_move_to_first_and_last_of_own_siblings() {
    let store = test_store().await;
    let (root, children) = root_with_children(&store, &["a", "b", "c"]).await;

    store
        .move_node(children[2].id(), children[2].id(), Position::FirstSibling)
        .await
        .unwrap();
    assert_eq!(
        titles(&store.get_children(root.id()).await.unwrap()),
        ["c", "a", "b"]
    );

    store
        .move_node(children[2].id(), children[0].id(), Position::LastSibling)
        .await
        .unwrap();
    assert_eq!(
        titles(&store.get_children(root.id()).await.unwrap()),
        ["a", "b", "c"]
    );
    assert_eq!(store.get(root.id()).await.unwrap().numchild(), 3);
    assert_consistent(&store).await;
}

#[tokio::test]
async fn test_move_subtree_keeps_its_shape() {
    let store = test_store().await;
    let (_, left) = root_with_children(&store, &["a", "b"]).await;
    let (other, _) = root_with_children(&store, &[]).await;

    let a = left[0].id();
    let a1 = store.add_child(a, page("a1")).await.unwrap();
    let a1x = store.add_child(a1.id(), page("a1x")).await.unwrap();
    store.add_child(a, page("a2")).await.unwrap();
    let shape_before: Vec<(String, usize)> = store
        .get_descendants(a)
        .await
        .unwrap()
        .iter()
        .map(|n| (title(n).to_string(), n.depth()))
        .collect();

    store.move_node(a, other.id(), Position::LastChild).await.unwrap();

    let shape_after: Vec<(String, usize)> = store
        .get_descendants(a)
        .await
        .unwrap()
        .iter()
        .map(|n| (title(n).to_string(), n.depth()))
        .collect();
    assert_eq!(shape_before, shape_after);

    let ancestors = store.get_ancestors(a1x.id()).await.unwrap();
    assert_eq!(titles(&ancestors), ["root", "a", "a1"]);
    assert_eq!(ancestors[0].id(), other.id());
    assert_eq!(store.get(left[0].id()).await.unwrap().depth(), 2);
    assert_consistent(&store).await;
}

#[tokio::test]
async fn test_move_changes_depth() {
    let store = test_store().await;
    let (root, children) = root_with_children(&store, &["a", "b"]).await;
    let b1 = store.add_child(children[1].id(), page("b1")).await.unwrap();

    // Promote a grandchild to a root, then push a root two levels down.
    store.move_node(b1.id(), root.id(), Position::Left).await.unwrap();
    let b1 = store.get(b1.id()).await.unwrap();
    assert!(b1.is_root());
    assert_eq!(store.get(children[1].id()).await.unwrap().numchild(), 0);

    store
        .move_node(b1.id(), children[0].id(), Position::FirstChild)
        .await
        .unwrap();
    let b1 = store.get(b1.id()).await.unwrap();
    assert_eq!(b1.depth(), 3);
    assert_eq!(
        titles(&store.get_root_nodes().await.unwrap()),
        ["root"]
    );
    assert_consistent(&store).await;
}

/// `(id, path, numchild)` of every node, in tree order.
async fn layout(store: &TreeStore) -> Vec<(NodeId, String, u64)> {
    store
        .get_tree(None)
        .await
        .unwrap()
        .iter()
        .map(|n| (n.id(), n.path().to_string(), n.numchild()))
        .collect()
}

#[tokio::test]
async fn test_move_and_back_restores_paths() {
    let store = test_store().await;
    let (root, children) = root_with_children(&store, &["a", "b", "c", "d"]).await;
    for child in &children {
        store.add_child(child.id(), page("leaf")).await.unwrap();
    }
    let other = store.add_root(page("other")).await.unwrap();
    let before = layout(&store).await;

    // Each child returns to the slot it left, whatever its position.
    for (i, child) in children.iter().enumerate() {
        store
            .move_node(child.id(), other.id(), Position::LastChild)
            .await
            .unwrap();
        assert_eq!(store.get(other.id()).await.unwrap().numchild(), 1);
        assert_eq!(store.get(root.id()).await.unwrap().numchild(), 3);

        if i == 0 {
            store
                .move_node(child.id(), children[1].id(), Position::Left)
                .await
                .unwrap();
        } else {
            store
                .move_node(child.id(), children[i - 1].id(), Position::Right)
                .await
                .unwrap();
        }
        assert_eq!(layout(&store).await, before, "round trip of child {i}");
    }
    assert_eq!(
        titles(&store.get_children(root.id()).await.unwrap()),
        ["a", "b", "c", "d"]
    );
    assert_consistent(&store).await;
}

#[tokio::test]
async fn test_move_into_full_parent_overflows_and_rolls_back() {
    let store = test_store_with(tiny_config()).await;
    let full = store.add_root(NodeSpec::default()).await.unwrap();
    for _ in 0..4 {
        store.add_child(full.id(), NodeSpec::default()).await.unwrap();
    }
    let loose = store.add_root(page("loose")).await.unwrap();
    let before = store.get_tree(None).await.unwrap();

    let err = store
        .move_node(loose.id(), full.id(), Position::LastChild)
        .await
        .unwrap_err();
    assert!(err.is_path_overflow(), "{err}");

    assert_eq!(store.get_tree(None).await.unwrap(), before);
    assert_consistent(&store).await;
}

#[tokio::test]
async fn test_move_within_full_parent() {
    let store = test_store_with(tiny_config()).await;
    let root = store.add_root(NodeSpec::default()).await.unwrap();
    for i in 0..4 {
        store.add_child(root.id(), page(&i.to_string())).await.unwrap();
    }
    let children = store.get_children(root.id()).await.unwrap();

    // The parked node frees its own slot, so reordering a full level works.
    store
        .move_node(children[3].id(), children[0].id(), Position::Left)
        .await
        .unwrap();
    assert_eq!(
        titles(&store.get_children(root.id()).await.unwrap()),
        ["3", "0", "1", "2"]
    );
    assert_consistent(&store).await;
}
