use crate::builder::CacheBuilder;
use crate::entry::{EntryMetadata, ItemType};
use crate::error::CacheError;
use crate::expiry::ExpiryIndex;
use crate::gc::GarbageCollector;
use crate::metrics::{CacheStats, HitsMisses};
use crate::recency::RecencyList;
use crate::store::IdentityStore;
use crate::tags::TagIndex;
use crate::time::{Clock, Timestamp};

use std::collections::hash_map::Entry;
use std::fmt;
use std::hash::Hash;
use std::ops::AddAssign;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

/// Reads the metadata slot out of a value.
pub(crate) type MetadataSlot<V> = fn(&mut V) -> &mut Option<EntryMetadata>;

/// Per-call options for [`ManagedCache::add`] and the fetch variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddOptions {
  /// Expire the entry this long after it is written. Fractional seconds
  /// round up.
  pub ttl: Option<Duration>,
  /// Labels to attach the entry to.
  pub tags: Vec<String>,
}

impl AddOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn ttl(mut self, ttl: Duration) -> Self {
    self.ttl = Some(ttl);
    self
  }

  pub fn tag(mut self, tag: impl Into<String>) -> Self {
    self.tags.push(tag.into());
    self
  }

  pub fn tags<I, T>(mut self, tags: I) -> Self
  where
    I: IntoIterator<Item = T>,
    T: Into<String>,
  {
    self.tags.extend(tags.into_iter().map(Into::into));
    self
  }
}

/// What a single collection pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CollectReport {
  /// Entries removed because their expiry had passed.
  pub expired: usize,
  /// Entries removed to bring the cache back under its capacity.
  pub evicted: usize,
  /// Empty expiry buckets dropped from the expiry index.
  pub reclaimed: usize,
}

impl CollectReport {
  /// Entries removed from the cache, for any reason.
  #[inline]
  pub fn removed(&self) -> usize {
    self.expired + self.evicted
  }
}

impl AddAssign for CollectReport {
  fn add_assign(&mut self, other: Self) {
    self.expired += other.expired;
    self.evicted += other.evicted;
    self.reclaimed += other.reclaimed;
  }
}

// Everything keyed by a live key besides the store itself.
struct Indexes<K> {
  recency: RecencyList<K>,
  expiry: ExpiryIndex<K>,
  // Created on first tag use.
  tags: Option<TagIndex<K>>,
}

impl<K: Eq + Hash + Clone> Indexes<K> {
  fn new() -> Self {
    Self {
      recency: RecencyList::new(),
      expiry: ExpiryIndex::new(),
      tags: None,
    }
  }

  // Touches the key and records the options. Returns the new expiry.
  fn attach(&mut self, key: &K, options: &AddOptions, now: Timestamp) -> Option<Timestamp> {
    self.recency.upsert(key.clone());
    let expires_at = options
      .ttl
      .map(|ttl| self.expiry.set_expiry(key.clone(), ttl, now));
    if !options.tags.is_empty() {
      let tags = self.tags.get_or_insert_with(TagIndex::new);
      for tag in &options.tags {
        tags.set_tag(key.clone(), tag.as_str());
      }
    }
    expires_at
  }

  // Drops the expiry and tags of a key, leaving its recency position alone.
  fn forget_options(&mut self, key: &K) {
    self.expiry.remove_expiry(key);
    if let Some(tags) = self.tags.as_mut() {
      tags.remove_key(key);
    }
  }

  fn detach(&mut self, key: &K) {
    self.recency.remove(key);
    self.forget_options(key);
  }

  fn tags_count(&self) -> usize {
    self.tags.as_ref().map_or(0, TagIndex::len)
  }

  fn clear(&mut self) {
    self.recency.clear();
    self.expiry.clear();
    if let Some(tags) = self.tags.as_mut() {
      tags.clear();
    }
  }
}

/// A keyed object cache with recency tracking, TTL expiry, tag grouping and
/// probabilistic garbage collection.
///
/// Every mutating call keeps the indexes consistent with the store: a key is
/// in the recency list iff it is live, and a key only has an expiry or tags
/// while it is live.
///
/// Expiry is advisory. [`get`](Self::get) serves an expired entry until a
/// collection pass removes it.
pub struct ManagedCache<K, V> {
  store: IdentityStore<K, V>,
  indexes: Indexes<K>,
  counters: HitsMisses,
  gc: GarbageCollector,
  item_type: Option<Arc<dyn ItemType<V>>>,
  metadata: Option<MetadataSlot<V>>,
  capacity: Option<usize>,
  clock: Arc<dyn Clock>,
}

impl<K, V> fmt::Debug for ManagedCache<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ManagedCache")
      .field("store", &self.store)
      .field("counters", &self.counters)
      .field("gc", &self.gc)
      .field("item_type", &self.item_type.as_ref().map(|item_type| item_type.name()))
      .field("tracks_metadata", &self.metadata.is_some())
      .field("capacity", &self.capacity)
      .field("clock", &self.clock)
      .finish_non_exhaustive()
  }
}

impl<K, V> ManagedCache<K, V>
where
  K: Eq + Hash + Clone,
{
  /// An unbounded cache with a disabled collector and no declared item type.
  pub fn new() -> Self {
    CacheBuilder::new().assemble()
  }

  pub fn builder() -> CacheBuilder<K, V> {
    CacheBuilder::new()
  }

  pub(crate) fn from_parts(
    gc: GarbageCollector,
    item_type: Option<Arc<dyn ItemType<V>>>,
    metadata: Option<MetadataSlot<V>>,
    capacity: Option<usize>,
    clock: Arc<dyn Clock>,
  ) -> Self {
    Self {
      store: IdentityStore::new(),
      indexes: Indexes::new(),
      counters: HitsMisses::new(),
      gc,
      item_type,
      metadata,
      capacity,
      clock,
    }
  }

  /// Whether the key is live. Counts nothing and touches nothing.
  #[inline]
  pub fn has(&self, key: &K) -> bool {
    self.store.has(key)
  }

  /// Looks a key up, counting a hit or a miss.
  ///
  /// A hit marks the key as most recently used and bumps the `"hits"` stat of
  /// tracked metadata. Expiry is not consulted.
  pub fn get(&mut self, key: &K) -> Option<&V> {
    let Some(value) = self.store.get_mut(key) else {
      self.counters.miss();
      return None;
    };
    self.counters.hit();
    self.indexes.recency.update(key);
    record_hit(self.metadata, &mut *value);
    Some(&*value)
  }

  /// Looks a key up without counting or touching it.
  #[inline]
  pub fn peek(&self, key: &K) -> Option<&V> {
    self.store.get(key)
  }

  /// Stores a value, replacing any entry under the same key.
  ///
  /// A replaced entry's expiry and tags are dropped in favor of `options`.
  /// Fails with [`CacheError::TypeMismatch`], writing nothing, when the cache
  /// declares an item type that refuses the value.
  pub fn add(&mut self, key: K, value: V, options: AddOptions) -> Result<(), CacheError> {
    let mut value = value;
    check_item_type(self.item_type.as_deref(), &value)?;

    self.indexes.forget_options(&key);
    let expires_at = self.indexes.attach(&key, &options, self.clock.now());
    stamp_metadata(self.metadata, &mut value, expires_at);
    self.store.add(key, value);
    Ok(())
  }

  /// Like [`get`](Self::get), but on a miss stores and returns what `loader`
  /// produces.
  pub fn get_or_fetch<F>(&mut self, key: K, loader: F, options: AddOptions) -> Result<&V, CacheError>
  where
    F: FnOnce() -> V,
  {
    self.try_get_or_fetch(key, || Ok::<_, CacheError>(loader()), options)
  }

  /// Like [`get_or_fetch`](Self::get_or_fetch) with a fallible loader.
  ///
  /// A loader error is returned as-is and nothing is written. The miss is
  /// still counted.
  pub fn try_get_or_fetch<F, E>(&mut self, key: K, loader: F, options: AddOptions) -> Result<&V, E>
  where
    F: FnOnce() -> Result<V, E>,
    E: From<CacheError>,
  {
    match self.store.entry(key) {
      Entry::Occupied(entry) => {
        self.counters.hit();
        self.indexes.recency.update(entry.key());
        let value = entry.into_mut();
        record_hit(self.metadata, &mut *value);
        Ok(&*value)
      }
      Entry::Vacant(entry) => {
        self.counters.miss();
        let mut value = loader()?;
        check_item_type(self.item_type.as_deref(), &value)?;

        // The TTL runs from the write, not from the start of the load.
        let now = self.clock.now();
        let expires_at = self.indexes.attach(entry.key(), &options, now);
        stamp_metadata(self.metadata, &mut value, expires_at);
        Ok(&*entry.insert(value))
      }
    }
  }

  /// Removes a key from the store and every index.
  ///
  /// Tracked metadata on the returned value is marked deleted.
  pub fn remove(&mut self, key: &K) -> Option<V> {
    let mut value = self.store.remove(key)?;
    self.indexes.detach(key);
    if let Some(slot) = self.metadata {
      slot(&mut value)
        .get_or_insert_with(EntryMetadata::default)
        .is_deleted = true;
    }
    Some(value)
  }

  /// Removes every entry carrying `tag`, returning how many were removed.
  pub fn invalidate_tag(&mut self, tag: &str) -> usize {
    let keys: Vec<K> = match &self.indexes.tags {
      Some(tags) => tags.keys_for(tag).cloned().collect(),
      None => return 0,
    };
    keys.iter().filter(|key| self.remove(key).is_some()).count()
  }

  /// Empties the store and every index. Hit and miss counters are kept.
  pub fn clear(&mut self) {
    self.store.clear();
    self.indexes.clear();
  }

  pub fn reset_counters(&mut self) {
    self.counters.reset();
  }

  /// Runs one reclamation pass for the collector's kinds.
  ///
  /// TTL and LFRU remove every expired key. LRU and LFRU evict the least
  /// recently used keys until the cache fits its capacity; without a capacity
  /// there is nothing to evict. Empty expiry buckets queued by earlier
  /// removals are always reclaimed.
  pub fn collect(&mut self) -> CollectReport {
    let kinds = self.gc.kinds();
    let mut report = CollectReport::default();

    if kinds.reclaims_expired() {
      let now = self.clock.now();
      for key in self.indexes.expiry.expired_keys(now) {
        if self.remove(&key).is_some() {
          trace!(timestamp = now, "Removed expired entry");
          report.expired += 1;
        }
      }
    }

    if kinds.evicts_by_recency() {
      if let Some(capacity) = self.capacity {
        let excess = self.store.len().saturating_sub(capacity);
        for key in self.indexes.recency.first(excess) {
          if self.remove(&key).is_some() {
            trace!(capacity = capacity, "Evicted least recently used entry");
            report.evicted += 1;
          }
        }
      }
    }

    report.reclaimed = self.indexes.expiry.reclaim();
    debug!(
      expired = report.expired,
      evicted = report.evicted,
      reclaimed = report.reclaimed,
      remaining = self.store.len(),
      "Collection pass finished"
    );
    report
  }

  /// Draws the collector's trigger and runs [`collect`](Self::collect) only
  /// when it fires.
  pub fn run_gc(&mut self) -> Option<CollectReport> {
    if self.gc.is_triggered() {
      Some(self.collect())
    } else {
      None
    }
  }

  pub fn stats(&self) -> CacheStats {
    CacheStats::new(&self.counters, self.store.len(), self.indexes.tags_count())
  }

  #[inline]
  pub fn hits(&self) -> u64 {
    self.counters.hits()
  }

  #[inline]
  pub fn misses(&self) -> u64 {
    self.counters.misses()
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.store.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.store.is_empty()
  }

  pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
    self.store.keys()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
    self.store.iter()
  }

  /// The tags attached to a live key, in no particular order.
  pub fn tags_for<'a>(&'a self, key: &'a K) -> impl Iterator<Item = &'a str> + 'a {
    self.indexes.tags.iter().flat_map(|tags| tags.tags_for(key))
  }

  /// The live keys carrying `tag`, in no particular order.
  pub fn keys_for_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a K> + 'a {
    self.indexes.tags.iter().flat_map(|tags| tags.keys_for(tag))
  }

  #[inline]
  pub fn expires_at(&self, key: &K) -> Option<Timestamp> {
    self.indexes.expiry.expires_at(key)
  }

  /// Whether the key's expiry has passed on the cache clock. Keys without a
  /// TTL never expire.
  pub fn is_expired(&self, key: &K) -> bool {
    self.indexes.expiry.is_expired(key, self.clock.now())
  }

  /// Live keys whose expiry has passed but which no collection pass has
  /// removed yet.
  pub fn expired_keys(&self) -> Vec<K> {
    self.indexes.expiry.expired_keys(self.clock.now())
  }

  /// The `count` least recently used keys, stalest first.
  pub fn least_recent(&self, count: usize) -> Vec<K> {
    self.indexes.recency.first(count)
  }

  /// The `count` most recently used keys, the freshest last.
  pub fn most_recent(&self, count: usize) -> Vec<K> {
    self.indexes.recency.last(count)
  }

  /// Empty expiry buckets waiting for the next collection pass.
  #[inline]
  pub fn pending_reclaim(&self) -> usize {
    self.indexes.expiry.pending_reclaim()
  }

  #[inline]
  pub fn item_type(&self) -> Option<&dyn ItemType<V>> {
    self.item_type.as_deref()
  }

  #[inline]
  pub fn tracks_metadata(&self) -> bool {
    self.metadata.is_some()
  }

  #[inline]
  pub fn gc(&self) -> &GarbageCollector {
    &self.gc
  }

  #[inline]
  pub fn capacity(&self) -> Option<usize> {
    self.capacity
  }

  /// The current reading of the cache clock.
  #[inline]
  pub fn now(&self) -> Timestamp {
    self.clock.now()
  }
}

impl<K: Eq + Hash + Clone, V> Default for ManagedCache<K, V> {
  fn default() -> Self {
    Self::new()
  }
}

fn check_item_type<V>(item_type: Option<&dyn ItemType<V>>, value: &V) -> Result<(), CacheError> {
  match item_type {
    Some(item_type) if !item_type.accepts(value) => {
      debug!(expected = item_type.name(), "Rejected value of undeclared type");
      Err(CacheError::TypeMismatch {
        expected: item_type.name().to_owned(),
      })
    }
    _ => Ok(()),
  }
}

fn stamp_metadata<V>(slot: Option<MetadataSlot<V>>, value: &mut V, expires_at: Option<Timestamp>) {
  let Some(slot) = slot else {
    return;
  };
  let current = slot(value);
  if let Some(metadata) = current.as_mut() {
    metadata.is_deleted = false;
    metadata.expires_at = expires_at;
  } else {
    *current = Some(EntryMetadata::with_expiry(expires_at));
  }
}

fn record_hit<V>(slot: Option<MetadataSlot<V>>, value: &mut V) {
  if let Some(slot) = slot {
    slot(value)
      .get_or_insert_with(EntryMetadata::default)
      .bump(EntryMetadata::HITS);
  }
}
