mod common;

use common::*;
use managed_cache::{AddOptions, GcKind};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[test]
fn test_expired_entries_are_reported_but_still_served() {
  let (mut cache, clock) = cache_with_clock();
  cache.add("a", 1, AddOptions::default()).unwrap();
  cache.add("b", 2, AddOptions::new().ttl(SECS_10)).unwrap();
  cache.add("c", 3, AddOptions::default()).unwrap();

  clock.advance(Duration::from_secs(9));
  assert!(cache.expired_keys().is_empty());
  assert!(!cache.is_expired(&"b"));

  clock.advance(Duration::from_secs(1));
  assert_eq!(cache.expired_keys(), vec!["b"]);
  assert!(cache.is_expired(&"b"));
  assert_eq!(cache.stats().count, 3, "expiry alone removes nothing");

  // Reads do not consult expiry.
  assert_eq!(cache.get(&"b"), Some(&2));
  assert_eq!(cache.hits(), 1);

  cache.remove(&"b");
  assert_eq!(cache.stats().count, 2);
  assert!(cache.expired_keys().is_empty());
}

#[test]
fn test_zero_ttl_expires_immediately() {
  let (mut cache, _clock) = cache_with_clock();
  cache
    .add("k", 1, AddOptions::new().ttl(Duration::ZERO))
    .unwrap();

  assert_eq!(cache.expires_at(&"k"), Some(START));
  assert!(cache.is_expired(&"k"));
}

#[test]
fn test_entry_without_ttl_never_expires() {
  let (mut cache, clock) = cache_with_clock();
  cache.add("k", 1, AddOptions::default()).unwrap();

  clock.set(u64::MAX);
  assert!(!cache.is_expired(&"k"));
  assert_eq!(cache.expires_at(&"k"), None);
}

#[test]
fn test_sub_second_ttl_rounds_up() {
  let (mut cache, _clock) = cache_with_clock();
  cache
    .add("k", 1, AddOptions::new().ttl(Duration::from_millis(200)))
    .unwrap();

  assert_eq!(cache.expires_at(&"k"), Some(START + 1));
  assert!(!cache.is_expired(&"k"));
}

#[test]
fn test_readding_resets_expiry() {
  let (mut cache, clock) = cache_with_clock();
  cache.add("k", 1, AddOptions::new().ttl(SECS_10)).unwrap();

  clock.advance(Duration::from_secs(8));
  cache.add("k", 2, AddOptions::new().ttl(SECS_10)).unwrap();
  assert_eq!(cache.expires_at(&"k"), Some(START + 18));

  clock.advance(Duration::from_secs(5));
  assert!(cache.expired_keys().is_empty());
}

#[test]
fn test_fetched_entry_ttl_starts_after_slow_load() {
  let (mut cache, clock) = cache_with_clock();
  let loader_clock = clock.clone();

  let value = cache
    .get_or_fetch(
      "k",
      || {
        loader_clock.advance(Duration::from_secs(5));
        7
      },
      AddOptions::new().ttl(SECS_10),
    )
    .copied();

  assert_eq!(value, Ok(7));
  assert_eq!(cache.expires_at(&"k"), Some(START + 15));
  clock.advance(Duration::from_secs(9));
  assert!(!cache.is_expired(&"k"));
}

#[test]
fn test_ttl_collection_removes_only_expired() {
  let (builder, clock) = builder_with_clock();
  let mut cache = builder.gc_kinds(GcKind::Ttl).build().unwrap();

  cache.add("short", 1, AddOptions::new().ttl(Duration::from_secs(5))).unwrap();
  cache.add("long", 2, AddOptions::new().ttl(Duration::from_secs(50))).unwrap();
  cache.add("forever", 3, AddOptions::default()).unwrap();

  clock.advance(SECS_10);
  let report = cache.collect();

  assert_eq!(report.expired, 1);
  assert_eq!(report.evicted, 0);
  assert_eq!(report.reclaimed, 1, "the emptied bucket is reclaimed in the same pass");
  assert_eq!(sorted(cache.keys().copied().collect()), vec!["forever", "long"]);
  assert_eq!(cache.pending_reclaim(), 0);
}

#[test]
fn test_collection_without_ttl_kind_keeps_expired() {
  let (builder, clock) = builder_with_clock();
  let mut cache = builder.gc_kinds(GcKind::Lru).capacity(10).build().unwrap();

  cache.add("k", 1, AddOptions::new().ttl(Duration::ZERO)).unwrap();
  clock.advance(SECS_10);

  assert_eq!(cache.collect().expired, 0);
  assert!(cache.has(&"k"));
}

#[test]
fn test_lfru_collection_removes_expired() {
  let (builder, clock) = builder_with_clock();
  let mut cache = builder.gc_kinds(GcKind::Lfru).build().unwrap();

  cache.add("k", 1, AddOptions::new().ttl(Duration::from_secs(1))).unwrap();
  clock.advance(Duration::from_secs(1));

  assert_eq!(cache.collect().expired, 1);
  assert!(cache.is_empty());
}

#[test]
fn test_removals_defer_bucket_cleanup_until_collection() {
  let (mut cache, _clock) = cache_with_clock();
  cache.add("a", 1, AddOptions::new().ttl(SECS_10)).unwrap();
  cache.add("b", 2, AddOptions::new().ttl(Duration::from_secs(20))).unwrap();

  cache.remove(&"a");
  cache.remove(&"b");
  assert_eq!(cache.pending_reclaim(), 2);

  // A collector with no kinds still drains the queue.
  let report = cache.collect();
  assert_eq!(report.reclaimed, 2);
  assert_eq!(cache.pending_reclaim(), 0);
}
