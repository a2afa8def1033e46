use crate::cache::{AddOptions, CollectReport, ManagedCache};
use crate::error::CacheError;
use crate::metrics::CacheStats;

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

/// A thread-safe handle to a [`ManagedCache`].
///
/// One mutex guards the whole cache, so each call runs as a single critical
/// section over the store and every index together. Clones share the same
/// cache.
pub struct SharedCache<K, V> {
  inner: Arc<Mutex<ManagedCache<K, V>>>,
}

impl<K, V> Clone for SharedCache<K, V> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl<K, V> fmt::Debug for SharedCache<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.inner.try_lock() {
      Some(cache) => f.debug_struct("SharedCache").field("cache", &*cache).finish(),
      None => f.debug_struct("SharedCache").finish_non_exhaustive(),
    }
  }
}

impl<K, V> From<ManagedCache<K, V>> for SharedCache<K, V> {
  fn from(cache: ManagedCache<K, V>) -> Self {
    Self {
      inner: Arc::new(Mutex::new(cache)),
    }
  }
}

impl<K, V> SharedCache<K, V>
where
  K: Eq + Hash + Clone,
{
  pub fn new(cache: ManagedCache<K, V>) -> Self {
    cache.into()
  }

  /// Runs `f` with exclusive access to the cache.
  ///
  /// The lock is held for the whole closure, so keep it short and do not call
  /// back into this handle from inside it.
  pub fn with<F, R>(&self, f: F) -> R
  where
    F: FnOnce(&mut ManagedCache<K, V>) -> R,
  {
    f(&mut *self.inner.lock())
  }

  /// Looks up an entry and, if found, applies a closure to the value while
  /// the lock is held. Counts a hit or a miss like [`ManagedCache::get`].
  pub fn get<F, R>(&self, key: &K, f: F) -> Option<R>
  where
    F: FnOnce(&V) -> R,
  {
    self.inner.lock().get(key).map(f)
  }

  /// Returns a clone of the value, counting a hit or a miss.
  pub fn get_cloned(&self, key: &K) -> Option<V>
  where
    V: Clone,
  {
    self.get(key, V::clone)
  }

  /// Returns a clone of the cached value, loading it first on a miss. The
  /// loader runs under the lock.
  pub fn get_or_fetch<F>(&self, key: K, loader: F, options: AddOptions) -> Result<V, CacheError>
  where
    F: FnOnce() -> V,
    V: Clone,
  {
    self
      .inner
      .lock()
      .get_or_fetch(key, loader, options)
      .map(V::clone)
  }

  #[inline]
  pub fn has(&self, key: &K) -> bool {
    self.inner.lock().has(key)
  }

  pub fn add(&self, key: K, value: V, options: AddOptions) -> Result<(), CacheError> {
    self.inner.lock().add(key, value, options)
  }

  pub fn remove(&self, key: &K) -> Option<V> {
    self.inner.lock().remove(key)
  }

  pub fn invalidate_tag(&self, tag: &str) -> usize {
    self.inner.lock().invalidate_tag(tag)
  }

  pub fn clear(&self) {
    self.inner.lock().clear();
  }

  pub fn collect(&self) -> CollectReport {
    self.inner.lock().collect()
  }

  pub fn run_gc(&self) -> Option<CollectReport> {
    self.inner.lock().run_gc()
  }

  pub fn stats(&self) -> CacheStats {
    self.inner.lock().stats()
  }

  pub fn len(&self) -> usize {
    self.inner.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.lock().is_empty()
  }
}
