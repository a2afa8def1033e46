mod common;

use common::*;
use managed_cache::{AddOptions, CacheError, ManagedCache};
use pretty_assertions::assert_eq;
use std::cell::Cell;

#[test]
fn test_add_then_get_returns_value() {
  let mut cache = ManagedCache::new();
  cache.add("key", "value", AddOptions::default()).unwrap();

  assert!(cache.has(&"key"));
  assert_eq!(cache.get(&"key"), Some(&"value"));
  assert_eq!(cache.len(), 1);
}

#[test]
fn test_get_counts_hits_and_misses() {
  let mut cache = ManagedCache::new();
  cache.add(1, 10, AddOptions::default()).unwrap();

  assert!(cache.get(&1).is_some());
  assert_eq!((cache.hits(), cache.misses()), (1, 0));

  assert!(cache.get(&2).is_none());
  assert_eq!((cache.hits(), cache.misses()), (1, 1));

  let stats = cache.stats();
  assert_eq!(stats.hit_rate, 0.5);
  assert_eq!(stats.miss_rate, 0.5);
  assert_eq!(stats.count, 1);
}

#[test]
fn test_has_and_peek_do_not_count() {
  let mut cache = ManagedCache::new();
  cache.add(1, 10, AddOptions::default()).unwrap();
  cache.add(2, 20, AddOptions::default()).unwrap();

  assert!(cache.has(&1));
  assert!(!cache.has(&3));
  assert_eq!(cache.peek(&1), Some(&10));

  assert_eq!((cache.hits(), cache.misses()), (0, 0));
  assert_eq!(cache.least_recent(1), vec![1], "peek must not touch recency");
}

#[test]
fn test_get_marks_most_recent() {
  let mut cache = ManagedCache::new();
  for key in 1..=3 {
    cache.add(key, key, AddOptions::default()).unwrap();
  }
  cache.get(&1);

  assert_eq!(cache.least_recent(3), vec![2, 3, 1]);
  assert_eq!(cache.most_recent(1), vec![1]);
}

#[test]
fn test_add_twice_keeps_one_entry() {
  let mut cache = ManagedCache::new();
  cache.add("k", 1, AddOptions::default()).unwrap();
  cache.add("k", 2, AddOptions::default()).unwrap();

  assert_eq!(cache.len(), 1);
  assert_eq!(cache.least_recent(10), vec!["k"]);
  assert_eq!(cache.get(&"k"), Some(&2), "last write wins");
}

#[test]
fn test_remove_returns_value_and_detaches() {
  let (mut cache, _clock) = cache_with_clock();
  cache
    .add("k", 1, AddOptions::new().ttl(SECS_10).tag("group"))
    .unwrap();

  assert_eq!(cache.remove(&"k"), Some(1));
  assert!(!cache.has(&"k"));
  assert!(cache.least_recent(10).is_empty());
  assert_eq!(cache.expires_at(&"k"), None);
  assert_eq!(cache.keys_for_tag("group").count(), 0);

  assert_eq!(cache.remove(&"k"), None, "absence is not an error");
}

#[test]
fn test_get_or_fetch_loads_once() {
  let mut cache = ManagedCache::new();
  let calls = Cell::new(0);
  let loader = || {
    calls.set(calls.get() + 1);
    String::from("loaded")
  };

  let first = cache.get_or_fetch(7, loader, AddOptions::default()).unwrap().clone();
  let second = cache.get_or_fetch(7, loader, AddOptions::default()).unwrap().clone();

  assert_eq!(first, "loaded");
  assert_eq!(second, "loaded");
  assert_eq!(calls.get(), 1);
  assert_eq!((cache.hits(), cache.misses()), (1, 1));
}

#[test]
fn test_get_or_fetch_applies_options_on_load() {
  let (mut cache, _clock) = cache_with_clock();
  cache
    .get_or_fetch("k", || 5, AddOptions::new().ttl(SECS_10).tag("loaded"))
    .unwrap();

  assert_eq!(cache.expires_at(&"k"), Some(START + 10));
  assert_eq!(cache.tags_for(&"k").collect::<Vec<_>>(), vec!["loaded"]);
}

#[derive(Debug, PartialEq)]
enum LoadError {
  Unavailable,
  Cache(CacheError),
}

impl From<CacheError> for LoadError {
  fn from(err: CacheError) -> Self {
    LoadError::Cache(err)
  }
}

#[test]
fn test_try_get_or_fetch_propagates_loader_error() {
  let mut cache = ManagedCache::<&str, i32>::new();
  let result = cache.try_get_or_fetch("k", || Err(LoadError::Unavailable), AddOptions::default());

  assert_eq!(result, Err(LoadError::Unavailable));
  assert!(!cache.has(&"k"), "nothing is written on loader failure");
  assert_eq!(cache.misses(), 1);

  let value = cache
    .try_get_or_fetch("k", || Ok::<_, LoadError>(3), AddOptions::default())
    .unwrap();
  assert_eq!(*value, 3);
}

#[test]
fn test_clear_keeps_counters() {
  let mut cache = ManagedCache::new();
  cache.add(1, 1, AddOptions::new().tag("t")).unwrap();
  cache.get(&1);
  cache.get(&2);

  cache.clear();

  assert!(cache.is_empty());
  assert_eq!(cache.stats().tags_count, 0);
  assert_eq!((cache.hits(), cache.misses()), (1, 1));

  cache.reset_counters();
  assert_eq!((cache.hits(), cache.misses()), (0, 0));
}

#[test]
fn test_iteration_sees_every_live_entry() {
  let mut cache = ManagedCache::new();
  for key in 0..5 {
    cache.add(key, key * 10, AddOptions::default()).unwrap();
  }
  cache.remove(&2);

  assert_eq!(sorted(cache.keys().copied().collect()), vec![0, 1, 3, 4]);
  let total: i32 = cache.iter().map(|(_, value)| value).sum();
  assert_eq!(total, 80);
}
