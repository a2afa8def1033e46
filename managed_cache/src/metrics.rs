use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Hit and miss counters for one cache.
///
/// Both counters only ever grow; clearing a cache leaves them untouched. Use
/// [`reset`](Self::reset) to start a fresh measurement window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitsMisses {
  hits: u64,
  misses: u64,
}

impl HitsMisses {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub fn hit(&mut self) {
    self.hits += 1;
  }

  #[inline]
  pub fn miss(&mut self) {
    self.misses += 1;
  }

  #[inline]
  pub fn hits(&self) -> u64 {
    self.hits
  }

  #[inline]
  pub fn misses(&self) -> u64 {
    self.misses
  }

  /// `hits / (hits + misses)`, or `0.0` when there were no hits.
  pub fn hit_rate(&self) -> f64 {
    if self.hits == 0 {
      return 0.0;
    }
    self.hits as f64 / (self.hits + self.misses) as f64
  }

  /// `misses / (hits + misses)`, or `0.0` when there were no misses.
  pub fn miss_rate(&self) -> f64 {
    if self.misses == 0 {
      return 0.0;
    }
    self.misses as f64 / (self.hits + self.misses) as f64
  }

  pub fn reset(&mut self) {
    self.hits = 0;
    self.misses = 0;
  }
}

/// A point-in-time, read-only snapshot of one cache.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CacheStats {
  /// The number of lookups that found a live key.
  pub hits: u64,
  /// The number of lookups that found nothing.
  pub misses: u64,
  /// hits / (hits + misses)
  pub hit_rate: f64,
  /// misses / (hits + misses)
  pub miss_rate: f64,
  /// Live entries.
  pub count: usize,
  /// Distinct tags attached to live entries.
  pub tags_count: usize,
}

impl CacheStats {
  pub(crate) fn new(counters: &HitsMisses, count: usize, tags_count: usize) -> Self {
    Self {
      hits: counters.hits(),
      misses: counters.misses(),
      hit_rate: counters.hit_rate(),
      miss_rate: counters.miss_rate(),
      count,
      tags_count,
    }
  }
}

impl fmt::Debug for CacheStats {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheStats")
      .field("hits", &self.hits)
      .field("misses", &self.misses)
      .field("hit_rate", &format!("{:.2}%", self.hit_rate * 100.0))
      .field("miss_rate", &format!("{:.2}%", self.miss_rate * 100.0))
      .field("count", &self.count)
      .field("tags_count", &self.tags_count)
      .finish()
  }
}
