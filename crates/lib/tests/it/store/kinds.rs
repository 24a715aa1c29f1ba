use mptree::{
    NodeSpec, Position, TreeConfig, TreeStore,
    registry::{KindRegistry, KindRule},
};

use crate::helpers::*;

async fn cms_store() -> TreeStore {
    let registry = KindRegistry::builder()
        .kind("collection")
        .kind(KindRule::new("page").under(["collection", "page"]))
        .kind(KindRule::new("asset").not_root().under(["page"]))
        .build()
        .unwrap();
    TreeStore::open_with_registry(test_backend().await, TreeConfig::named("cms"), registry)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_allowed_placements() {
    let store = cms_store().await;
    let docs = store.add_root(NodeSpec::of_kind("collection")).await.unwrap();
    let intro = store.add_child(docs.id(), NodeSpec::of_kind("page")).await.unwrap();
    store.add_child(intro.id(), NodeSpec::of_kind("asset")).await.unwrap();
    store.add_root(NodeSpec::of_kind("page")).await.unwrap();
    assert_consistent(&store).await;
}

#[tokio::test]
async fn test_rejected_placements() {
    let store = cms_store().await;
    let docs = store.add_root(NodeSpec::of_kind("collection")).await.unwrap();

    let err = store.add_root(NodeSpec::of_kind("asset")).await.unwrap_err();
    assert!(err.is_kind_rejected(), "{err}");

    let err = store
        .add_child(docs.id(), NodeSpec::of_kind("asset"))
        .await
        .unwrap_err();
    assert!(err.is_kind_rejected(), "{err}");

    let err = store
        .add_child(docs.id(), NodeSpec::of_kind("video"))
        .await
        .unwrap_err();
    assert!(err.is_kind_rejected());
    assert!(err.is_not_found(), "{err}");
    assert_eq!(err.module(), "registry");

    assert_eq!(store.get(docs.id()).await.unwrap().numchild(), 0);
}

#[tokio::test]
async fn test_move_checks_new_parent_kind() {
    let store = cms_store().await;
    let docs = store.add_root(NodeSpec::of_kind("collection")).await.unwrap();
    let intro = store.add_child(docs.id(), NodeSpec::of_kind("page")).await.unwrap();
    let image = store.add_child(intro.id(), NodeSpec::of_kind("asset")).await.unwrap();

    // An asset may not sit next to a page under a collection.
    let err = store
        .move_node(image.id(), intro.id(), Position::Right)
        .await
        .unwrap_err();
    assert!(err.is_kind_rejected(), "{err}");
    assert_eq!(
        store.get_parent(image.id()).await.unwrap().map(|p| p.id()),
        Some(intro.id())
    );

    let err = store
        .add_sibling(intro.id(), Position::Left, NodeSpec::of_kind("asset"))
        .await
        .unwrap_err();
    assert!(err.is_kind_rejected());
}
