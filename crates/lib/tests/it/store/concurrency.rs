use mptree::{NodeSpec, Position};

use crate::helpers::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts_get_distinct_slots() {
    let store = test_store().await;
    let root = store.add_root(page("root")).await.unwrap();

    let mut handles = Vec::new();
    for task in 0..8 {
        let store = store.clone();
        let parent = root.id();
        handles.push(tokio::spawn(async move {
            for i in 0..5 {
                let spec = NodeSpec::of_kind("page")
                    .with_data(serde_json::json!({ "title": format!("{task}-{i}") }));
                loop {
                    match store.add_child(parent, spec.clone()).await {
                        Ok(_) => break,
                        Err(err) if err.is_conflict() => tokio::task::yield_now().await,
                        Err(err) => panic!("insert failed: {err}"),
                    }
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let root = store.get(root.id()).await.unwrap();
    assert_eq!(root.numchild(), 40);
    assert_eq!(store.get_children(root.id()).await.unwrap().len(), 40);
    assert_consistent(&store).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_moves_and_reads() {
    let store = test_store().await;
    let (root, children) = root_with_children(&store, &["a", "b", "c", "d"]).await;

    let mut handles = Vec::new();
    for (i, child) in children.iter().enumerate() {
        let store = store.clone();
        let node = child.id();
        let target = children[(i + 1) % children.len()].id();
        handles.push(tokio::spawn(async move {
            for _ in 0..5 {
                let result = store.move_node(node, target, Position::Left).await;
                match result {
                    Ok(()) => {}
                    Err(err) if err.is_conflict() || err.is_invalid_move() => {}
                    Err(err) => panic!("move failed: {err}"),
                }
                // Readers always see a whole sibling list.
                let parent = store.get_parent(node).await.unwrap();
                assert!(parent.is_some());
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let children_after = store.get_children(root.id()).await.unwrap();
    assert_eq!(children_after.len(), 4);
    assert_eq!(store.get(root.id()).await.unwrap().numchild(), 4);
    assert_consistent(&store).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_children_reads_during_shifting_inserts() {
    let store = test_store().await;
    let (_, children) = root_with_children(&store, &["a", "x", "z"]).await;
    let x = children[1].id();
    for _ in 0..3 {
        store.add_child(x, page("x-child")).await.unwrap();
    }

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for i in 0..20 {
                let spec = page(&format!("left-{i}"));
                loop {
                    match store.add_sibling(x, Position::Left, spec.clone()).await {
                        Ok(_) => break,
                        Err(err) if err.is_conflict() => tokio::task::yield_now().await,
                        Err(err) => panic!("insert failed: {err}"),
                    }
                }
            }
        })
    };
    let reader = {
        let store = store.clone();
        tokio::spawn(async move {
            for _ in 0..50 {
                // Every read resolves x and its children from one snapshot.
                let kids = store.get_children(x).await.unwrap();
                assert_eq!(titles(&kids), ["x-child"; 3]);
                let ancestors = store.get_ancestors(kids[0].id()).await.unwrap();
                assert_eq!(ancestors.last().map(|n| n.id()), Some(x));
                tokio::task::yield_now().await;
            }
        })
    };
    writer.await.unwrap();
    reader.await.unwrap();
    assert_consistent(&store).await;
}
