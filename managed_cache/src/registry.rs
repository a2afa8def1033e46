use crate::builder::CacheBuilder;
use crate::cache::{CollectReport, ManagedCache};
use crate::config::CacheConfig;
use crate::error::BuildError;
use crate::metrics::CacheStats;

use ahash::{HashMap, HashMapExt};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

#[cfg(feature = "serde")]
use serde::Serialize;

use tracing::debug;

/// Aggregate statistics across every cache in a registry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RegistryStats {
  pub hits: u64,
  pub misses: u64,
  /// Per-cache snapshots, ordered by name.
  pub caches: BTreeMap<String, CacheStats>,
}

/// A set of named caches that share one configuration.
///
/// Caches are created on first request from the template builder. Each one
/// owns its own keys; nothing is shared between them.
pub struct CacheRegistry<K, V> {
  caches: HashMap<String, ManagedCache<K, V>>,
  template: CacheBuilder<K, V>,
}

impl<K, V> fmt::Debug for CacheRegistry<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheRegistry")
      .field("caches", &self.caches.len())
      .field("template", &self.template)
      .finish()
  }
}

impl<K, V> CacheRegistry<K, V>
where
  K: Eq + Hash + Clone,
{
  /// Creates an empty registry. The template is validated once here so later
  /// lazy creation cannot fail.
  pub fn new(template: CacheBuilder<K, V>) -> Result<Self, BuildError> {
    template.validate()?;
    Ok(Self {
      caches: HashMap::new(),
      template,
    })
  }

  pub fn from_config(config: &CacheConfig) -> Result<Self, BuildError> {
    Self::new(CacheBuilder::from_config(config))
  }

  /// Returns the cache called `name`, creating it from the template first if
  /// needed.
  pub fn get_or_create(&mut self, name: &str) -> &mut ManagedCache<K, V> {
    let template = &self.template;
    self.caches.entry(name.to_owned()).or_insert_with(|| {
      debug!(cache = name, "Creating managed cache");
      template.assemble()
    })
  }

  pub fn get(&self, name: &str) -> Option<&ManagedCache<K, V>> {
    self.caches.get(name)
  }

  pub fn get_mut(&mut self, name: &str) -> Option<&mut ManagedCache<K, V>> {
    self.caches.get_mut(name)
  }

  #[inline]
  pub fn contains(&self, name: &str) -> bool {
    self.caches.contains_key(name)
  }

  /// Clears one cache, keeping it registered. Returns `false` if no cache has
  /// that name.
  pub fn clear_one(&mut self, name: &str) -> bool {
    match self.caches.get_mut(name) {
      Some(cache) => {
        cache.clear();
        true
      }
      None => false,
    }
  }

  pub fn clear_all(&mut self) {
    for cache in self.caches.values_mut() {
      cache.clear();
    }
  }

  /// Gives every cache's collector a chance to fire. Returns how many caches
  /// ran a collection pass.
  pub fn run_gc(&mut self) -> usize {
    self
      .caches
      .values_mut()
      .filter_map(ManagedCache::run_gc)
      .count()
  }

  /// Runs a collection pass on every cache unconditionally.
  pub fn collect_all(&mut self) -> CollectReport {
    let mut total = CollectReport::default();
    for cache in self.caches.values_mut() {
      total += cache.collect();
    }
    total
  }

  /// Hits summed over every cache.
  pub fn hits(&self) -> u64 {
    self.caches.values().map(ManagedCache::hits).sum()
  }

  /// Misses summed over every cache.
  pub fn misses(&self) -> u64 {
    self.caches.values().map(ManagedCache::misses).sum()
  }

  pub fn stats(&self) -> RegistryStats {
    RegistryStats {
      hits: self.hits(),
      misses: self.misses(),
      caches: self
        .caches
        .iter()
        .map(|(name, cache)| (name.clone(), cache.stats()))
        .collect(),
    }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.caches.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.caches.is_empty()
  }

  pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
    self.caches.keys().map(String::as_str)
  }

  pub fn template(&self) -> &CacheBuilder<K, V> {
    &self.template
  }
}

impl<K: Eq + Hash + Clone, V> Default for CacheRegistry<K, V> {
  fn default() -> Self {
    Self {
      caches: HashMap::new(),
      template: CacheBuilder::new(),
    }
  }
}
