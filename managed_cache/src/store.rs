use ahash::{HashMap, HashMapExt};
use std::collections::hash_map::Entry;
use std::fmt;
use std::hash::Hash;

/// The key to value table at the bottom of a managed cache.
///
/// A key is live exactly when it is present here. Every other index kept by
/// the cache refers only to keys found in this store.
pub struct IdentityStore<K, V> {
  items: HashMap<K, V>,
}

impl<K, V> fmt::Debug for IdentityStore<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("IdentityStore")
      .field("len", &self.items.len())
      .finish()
  }
}

impl<K, V> Default for IdentityStore<K, V> {
  fn default() -> Self {
    Self {
      items: HashMap::new(),
    }
  }
}

impl<K: Eq + Hash, V> IdentityStore<K, V> {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub fn has(&self, key: &K) -> bool {
    self.items.contains_key(key)
  }

  #[inline]
  pub fn get(&self, key: &K) -> Option<&V> {
    self.items.get(key)
  }

  #[inline]
  pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
    self.items.get_mut(key)
  }

  /// Returns the stored value, calling `loader` to produce and store it only
  /// when the key is absent. No retry is attempted.
  pub fn get_or_fetch<F>(&mut self, key: K, loader: F) -> &mut V
  where
    F: FnOnce() -> V,
  {
    self.items.entry(key).or_insert_with(loader)
  }

  /// Stores `value` under `key`, replacing (and returning) any previous value.
  pub fn add(&mut self, key: K, value: V) -> Option<V> {
    self.items.insert(key, value)
  }

  /// Replaces the value of a live key. Returns `false` and stores nothing
  /// when the key is absent.
  pub fn update(&mut self, key: &K, value: V) -> bool {
    match self.items.get_mut(key) {
      Some(slot) => {
        *slot = value;
        true
      }
      None => false,
    }
  }

  pub fn remove(&mut self, key: &K) -> Option<V> {
    self.items.remove(key)
  }

  pub fn clear(&mut self) {
    self.items.clear();
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.items.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
    self.items.keys()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
    self.items.iter()
  }

  pub(crate) fn entry(&mut self, key: K) -> Entry<'_, K, V> {
    self.items.entry(key)
  }
}
