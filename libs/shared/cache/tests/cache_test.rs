use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use shared_cache::{DirectoryCache, KvBackend, MemoryKv, TimeRangeCache};

const WINDOW_START: &str = "2024-01-01T00:00:00Z";
const WINDOW_END: &str = "2024-01-31T00:00:00Z";

fn backend() -> Arc<dyn KvBackend> {
    Arc::new(MemoryKv::new())
}

#[tokio::test]
async fn put_then_get_round_trips() {
    let cache = TimeRangeCache::new(backend());
    let subject = Uuid::new_v4();
    let payload = vec!["a".to_string(), "b".to_string()];

    cache.put(subject, WINDOW_START, WINDOW_END, &payload).await;
    let cached: Option<Vec<String>> = cache.get(subject, WINDOW_START, WINDOW_END).await;

    assert_eq!(cached, Some(payload));
}

#[tokio::test]
async fn different_window_is_a_miss() {
    let cache = TimeRangeCache::new(backend());
    let subject = Uuid::new_v4();

    cache.put(subject, WINDOW_START, WINDOW_END, &vec![1, 2, 3]).await;
    let cached: Option<Vec<i32>> = cache
        .get(subject, "2024-02-01T00:00:00Z", "2024-02-28T00:00:00Z")
        .await;

    assert_eq!(cached, None);
}

#[tokio::test]
async fn invalidate_drops_every_window_for_the_subject() {
    let cache = TimeRangeCache::new(backend());
    let subject = Uuid::new_v4();

    cache.put(subject, WINDOW_START, WINDOW_END, &vec![1]).await;
    cache
        .put(subject, "2024-02-01T00:00:00Z", "2024-02-28T00:00:00Z", &vec![2])
        .await;

    cache.invalidate(subject).await;

    let first: Option<Vec<i32>> = cache.get(subject, WINDOW_START, WINDOW_END).await;
    let second: Option<Vec<i32>> = cache
        .get(subject, "2024-02-01T00:00:00Z", "2024-02-28T00:00:00Z")
        .await;
    assert_eq!(first, None);
    assert_eq!(second, None);
}

#[tokio::test]
async fn invalidate_is_scoped_to_one_subject() {
    let cache = TimeRangeCache::new(backend());
    let mutated = Uuid::new_v4();
    let untouched = Uuid::new_v4();

    cache.put(mutated, WINDOW_START, WINDOW_END, &vec![1]).await;
    cache.put(untouched, WINDOW_START, WINDOW_END, &vec![2]).await;

    cache.invalidate(mutated).await;

    let gone: Option<Vec<i32>> = cache.get(mutated, WINDOW_START, WINDOW_END).await;
    let kept: Option<Vec<i32>> = cache.get(untouched, WINDOW_START, WINDOW_END).await;
    assert_eq!(gone, None);
    assert_eq!(kept, Some(vec![2]));
}

#[tokio::test]
async fn entries_expire_after_the_ttl() {
    let cache = TimeRangeCache::with_ttl(backend(), Duration::from_millis(20));
    let subject = Uuid::new_v4();

    cache.put(subject, WINDOW_START, WINDOW_END, &vec![1]).await;
    tokio::time::sleep(Duration::from_millis(60)).await;

    let cached: Option<Vec<i32>> = cache.get(subject, WINDOW_START, WINDOW_END).await;
    assert_eq!(cached, None);
}

#[tokio::test]
async fn invalidating_an_empty_subject_is_a_noop() {
    let cache = TimeRangeCache::new(backend());
    cache.invalidate(Uuid::new_v4()).await;
}

#[tokio::test]
async fn directory_cache_round_trips_and_invalidates() {
    let cache = DirectoryCache::new(backend());
    let listing = vec!["alice".to_string(), "bob".to_string()];

    assert_eq!(cache.get::<Vec<String>>().await, None);

    cache.put(&listing).await;
    assert_eq!(cache.get::<Vec<String>>().await, Some(listing));

    cache.invalidate().await;
    assert_eq!(cache.get::<Vec<String>>().await, None);
}
