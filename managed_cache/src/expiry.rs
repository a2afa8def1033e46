use crate::time::{self, Timestamp};

use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;
use std::time::Duration;

/// A bidirectional index between keys and their expiration timestamps.
///
/// Keys sharing an expiration second live in one bucket, and the distinct
/// timestamps are kept in ascending order so expired keys can be collected by
/// scanning from the earliest bucket forward.
///
/// When a bucket becomes empty its timestamp is not dropped right away. It is
/// queued for reclamation and only removed by [`reclaim`](Self::reclaim),
/// which the garbage collector calls. Reads and writes never pay for that
/// cleanup.
pub struct ExpiryIndex<K> {
  key_expiry: HashMap<K, Timestamp>,
  buckets: HashMap<Timestamp, HashSet<K>>,
  timeline: BTreeSet<Timestamp>,
  pending_reclaim: HashSet<Timestamp>,
}

impl<K> fmt::Debug for ExpiryIndex<K> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ExpiryIndex")
      .field("keys", &self.key_expiry.len())
      .field("timestamps", &self.timeline.len())
      .field("pending_reclaim", &self.pending_reclaim.len())
      .finish()
  }
}

impl<K> Default for ExpiryIndex<K> {
  fn default() -> Self {
    Self {
      key_expiry: HashMap::new(),
      buckets: HashMap::new(),
      timeline: BTreeSet::new(),
      pending_reclaim: HashSet::new(),
    }
  }
}

impl<K: Eq + Hash + Clone> ExpiryIndex<K> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Records that `key` expires `ttl` after `now` and returns that timestamp.
  ///
  /// A previous expiry of the key is replaced. If the target bucket had been
  /// emptied and queued for reclamation it becomes live again.
  pub fn set_expiry(&mut self, key: K, ttl: Duration, now: Timestamp) -> Timestamp {
    self.remove_expiry(&key);

    let expires_at = now.saturating_add(time::ttl_secs(ttl));
    self.timeline.insert(expires_at);
    self
      .buckets
      .entry(expires_at)
      .or_default()
      .insert(key.clone());
    self.key_expiry.insert(key, expires_at);
    self.pending_reclaim.remove(&expires_at);
    expires_at
  }

  /// Detaches `key` from its bucket, returning the expiry it had.
  pub fn remove_expiry(&mut self, key: &K) -> Option<Timestamp> {
    let expires_at = self.key_expiry.remove(key)?;
    if let Some(bucket) = self.buckets.get_mut(&expires_at) {
      bucket.remove(key);
      if bucket.is_empty() {
        self.pending_reclaim.insert(expires_at);
      }
    }
    Some(expires_at)
  }

  /// Every key whose expiry is at or before `now`.
  ///
  /// The scan stops at the first bucket that lies in the future. Keys within
  /// one bucket come back in no particular order.
  pub fn expired_keys(&self, now: Timestamp) -> Vec<K> {
    let mut expired = Vec::new();
    for expires_at in self.timeline.range(..=now) {
      if let Some(bucket) = self.buckets.get(expires_at) {
        expired.extend(bucket.iter().cloned());
      }
    }
    expired
  }

  /// A key without a recorded expiry never expires.
  #[inline]
  pub fn is_expired(&self, key: &K, now: Timestamp) -> bool {
    self
      .key_expiry
      .get(key)
      .is_some_and(|&expires_at| now >= expires_at)
  }

  #[inline]
  pub fn expires_at(&self, key: &K) -> Option<Timestamp> {
    self.key_expiry.get(key).copied()
  }

  /// Drops every queued timestamp whose bucket is still empty, returning how
  /// many were removed.
  pub fn reclaim(&mut self) -> usize {
    let mut reclaimed = 0;
    for expires_at in self.pending_reclaim.drain() {
      if self.buckets.get(&expires_at).is_some_and(HashSet::is_empty) {
        self.buckets.remove(&expires_at);
        self.timeline.remove(&expires_at);
        reclaimed += 1;
      }
    }
    reclaimed
  }

  /// The number of keys with a recorded expiry.
  #[inline]
  pub fn len(&self) -> usize {
    self.key_expiry.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.key_expiry.is_empty()
  }

  /// The distinct expiry timestamps still present, earliest first. This
  /// includes emptied buckets that have not been reclaimed yet.
  pub fn timestamps(&self) -> impl Iterator<Item = Timestamp> + '_ {
    self.timeline.iter().copied()
  }

  /// The number of timestamps waiting for [`reclaim`](Self::reclaim).
  #[inline]
  pub fn pending_reclaim(&self) -> usize {
    self.pending_reclaim.len()
  }

  pub fn clear(&mut self) {
    self.key_expiry.clear();
    self.buckets.clear();
    self.timeline.clear();
    self.pending_reclaim.clear();
  }
}
