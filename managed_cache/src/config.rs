use crate::gc::GcKinds;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The trigger probability used when none is configured.
pub const DEFAULT_GC_PROBABILITY: f64 = 0.5;

fn default_probability() -> f64 {
  DEFAULT_GC_PROBABILITY
}

/// Garbage collection settings shared by every cache built from one config.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct GcConfig {
  /// Either a bit mask (`1` ttl, `2` lru, `4` lfru) or a list of names.
  #[cfg_attr(feature = "serde", serde(default))]
  pub kinds: GcKinds,
  #[cfg_attr(feature = "serde", serde(default = "default_probability"))]
  pub probability: f64,
  /// Seeds the trigger's random source for reproducible runs.
  #[cfg_attr(feature = "serde", serde(default))]
  pub seed: Option<u64>,
}

impl Default for GcConfig {
  fn default() -> Self {
    Self {
      kinds: GcKinds::NONE,
      probability: DEFAULT_GC_PROBABILITY,
      seed: None,
    }
  }
}

/// The serializable part of a cache's configuration.
///
/// Item types, metadata tracking and clocks are code, not data, and are set
/// on the [`CacheBuilder`](crate::CacheBuilder) directly.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct CacheConfig {
  #[cfg_attr(feature = "serde", serde(default))]
  pub gc: GcConfig,
  /// Upper bound enforced by LRU and LFRU collection passes.
  #[cfg_attr(feature = "serde", serde(default))]
  pub capacity: Option<usize>,
}
