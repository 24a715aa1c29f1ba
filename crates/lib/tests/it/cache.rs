use mptree::{Position, cache::NodeCache};

use crate::helpers::*;

#[tokio::test]
async fn test_cache_serves_a_request_from_memory() {
    let store = test_store().await;
    let (root, children) = root_with_children(&store, &["a", "b"]).await;
    let a1 = store.add_child(children[0].id(), page("a1")).await.unwrap();

    let mut cache = NodeCache::new(&store);
    let ancestors = cache.get_ancestors(a1.id()).await.unwrap();
    assert_eq!(titles(&ancestors), ["root", "a"]);
    // Ancestors were remembered individually.
    cache.get(root.id()).await.unwrap();
    cache.get(children[0].id()).await.unwrap();
    cache.get_ancestors(a1.id()).await.unwrap();

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 3);
    assert!(cache.revision().is_some());
}

#[tokio::test]
async fn test_cache_sees_moves_after_refresh() {
    let store = test_store().await;
    let (root, children) = root_with_children(&store, &["a", "b"]).await;

    let mut cache = NodeCache::new(&store);
    assert_eq!(
        titles(&cache.get_children(root.id()).await.unwrap()),
        ["a", "b"]
    );

    store
        .move_node(children[1].id(), children[0].id(), Position::Left)
        .await
        .unwrap();

    // Until refreshed the cache keeps answering from its snapshot.
    assert_eq!(
        titles(&cache.get_children(root.id()).await.unwrap()),
        ["a", "b"]
    );
    assert!(cache.refresh().await.unwrap());
    assert_eq!(
        titles(&cache.get_children(root.id()).await.unwrap()),
        ["b", "a"]
    );
}

#[tokio::test]
async fn test_separate_caches_are_independent() {
    let store = test_store().await;
    let root = store.add_root(page("root")).await.unwrap();

    let mut first = NodeCache::new(&store);
    let mut second = NodeCache::new(&store);
    first.get(root.id()).await.unwrap();
    first.get(root.id()).await.unwrap();
    second.get(root.id()).await.unwrap();

    assert_eq!(first.stats().hits, 1);
    assert_eq!(second.stats().hits, 0);

    first.clear();
    assert!(first.revision().is_none());
}
