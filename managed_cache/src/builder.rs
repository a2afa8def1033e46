use crate::cache::{ManagedCache, MetadataSlot};
use crate::config::{CacheConfig, GcConfig};
use crate::entry::{ItemType, SupportsCacheMetadata};
use crate::error::BuildError;
use crate::gc::{GarbageCollector, GcKind, GcKinds};
use crate::time::{Clock, MonotonicClock};

use core::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

/// A builder for creating [`ManagedCache`] instances.
///
/// A builder is also the template a [`CacheRegistry`](crate::CacheRegistry)
/// stamps its caches from, so it can be cloned and built more than once.
pub struct CacheBuilder<K, V> {
  gc: GcConfig,
  capacity: Option<usize>,
  item_type: Option<Arc<dyn ItemType<V>>>,
  metadata: Option<MetadataSlot<V>>,
  clock: Option<Arc<dyn Clock>>,
  _key_marker: PhantomData<K>,
}

impl<K, V> Clone for CacheBuilder<K, V> {
  fn clone(&self) -> Self {
    Self {
      gc: self.gc.clone(),
      capacity: self.capacity,
      item_type: self.item_type.clone(),
      metadata: self.metadata,
      clock: self.clock.clone(),
      _key_marker: PhantomData,
    }
  }
}

// Manual Debug implementation for CacheBuilder.
impl<K, V> fmt::Debug for CacheBuilder<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheBuilder")
      .field("gc", &self.gc)
      .field("capacity", &self.capacity)
      .field("item_type", &self.item_type.as_ref().map(|item_type| item_type.name()))
      .field("tracks_metadata", &self.metadata.is_some())
      .field("has_clock", &self.clock.is_some())
      .finish()
  }
}

// --- General Configuration Methods ---
// This impl block has no restrictive bounds on K or V.
impl<K, V> CacheBuilder<K, V> {
  /// Creates a builder for an unbounded cache whose collector never fires.
  pub fn new() -> Self {
    Self {
      gc: GcConfig::default(),
      capacity: None,
      item_type: None,
      metadata: None,
      clock: None,
      _key_marker: PhantomData,
    }
  }

  /// Starts from a deserialized configuration.
  pub fn from_config(config: &CacheConfig) -> Self {
    Self {
      gc: config.gc.clone(),
      capacity: config.capacity,
      ..Self::new()
    }
  }

  /// Sets which reclamation kinds a collection pass performs.
  pub fn gc_kinds(mut self, kinds: impl Into<GcKinds>) -> Self {
    self.gc.kinds = kinds.into();
    self
  }

  /// Adds one reclamation kind to those already configured.
  pub fn gc_kind(mut self, kind: GcKind) -> Self {
    self.gc.kinds = self.gc.kinds.with(kind);
    self
  }

  /// Sets the chance, per [`run_gc`](ManagedCache::run_gc) call, that a
  /// collection pass runs. Defaults to `0.5`.
  pub fn gc_probability(mut self, probability: f64) -> Self {
    self.gc.probability = probability;
    self
  }

  /// Seeds the collector's random source.
  pub fn gc_seed(mut self, seed: u64) -> Self {
    self.gc.seed = Some(seed);
    self
  }

  /// Bounds the cache size enforced by LRU and LFRU collection passes.
  ///
  /// Adding past the bound is always allowed; only a collection pass evicts.
  pub fn capacity(mut self, capacity: usize) -> Self {
    self.capacity = Some(capacity);
    self
  }

  /// Declares the item type. Values it refuses are rejected by `add`.
  pub fn item_type<T>(self, item_type: T) -> Self
  where
    T: ItemType<V> + 'static,
  {
    self.shared_item_type(Arc::new(item_type))
  }

  pub fn shared_item_type(mut self, item_type: Arc<dyn ItemType<V>>) -> Self {
    self.item_type = Some(item_type);
    self
  }

  /// Keeps the [`EntryMetadata`](crate::EntryMetadata) slot of every value up
  /// to date.
  pub fn track_metadata(mut self) -> Self
  where
    V: SupportsCacheMetadata,
  {
    self.metadata = Some(<V as SupportsCacheMetadata>::cache_metadata);
    self
  }

  /// Sets the clock used for expiry. Defaults to [`MonotonicClock`].
  pub fn clock<C>(self, clock: C) -> Self
  where
    C: Clock + 'static,
  {
    self.shared_clock(Arc::new(clock))
  }

  pub fn shared_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = Some(clock);
    self
  }

  pub(crate) fn validate(&self) -> Result<(), BuildError> {
    if self.capacity == Some(0) {
      return Err(BuildError::ZeroCapacity);
    }
    if !(0.0..=1.0).contains(&self.gc.probability) {
      return Err(BuildError::InvalidProbability(self.gc.probability));
    }
    Ok(())
  }
}

impl<K, V> Default for CacheBuilder<K, V> {
  fn default() -> Self {
    Self::new()
  }
}

// --- Build Methods ---
impl<K, V> CacheBuilder<K, V>
where
  K: Eq + Hash + Clone,
{
  /// Builds a [`ManagedCache`].
  pub fn build(&self) -> Result<ManagedCache<K, V>, BuildError> {
    self.validate()?;
    Ok(self.assemble())
  }

  // Callers must have passed `validate` first: `build` does on every call and
  // `CacheRegistry::new` once for its template.
  pub(crate) fn assemble(&self) -> ManagedCache<K, V> {
    debug_assert!(
      self.validate().is_ok(),
      "assembling a cache from an unvalidated builder"
    );
    let gc = match GarbageCollector::new(self.gc.kinds, self.gc.probability) {
      Ok(gc) => match self.gc.seed {
        Some(seed) => gc.with_seed(seed),
        None => gc,
      },
      Err(_) => GarbageCollector::disabled(),
    };
    let clock = self
      .clock
      .clone()
      .unwrap_or_else(|| Arc::new(MonotonicClock));

    ManagedCache::from_parts(gc, self.item_type.clone(), self.metadata, self.capacity, clock)
  }
}
