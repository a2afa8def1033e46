use crate::error::{BuildError, GcCallbackError};

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single reclamation strategy.
///
/// `Lfru` is its own flag rather than the union of the other two; it asks for
/// both expired-key removal and recency eviction in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum GcKind {
  Ttl = 1,
  Lru = 2,
  Lfru = 4,
}

impl GcKind {
  const VARIANTS: [GcKind; 3] = [GcKind::Ttl, GcKind::Lru, GcKind::Lfru];

  #[inline]
  pub const fn bit(self) -> u8 {
    self as u8
  }
}

/// An immutable set of [`GcKind`]s, stored as bit flags.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GcKinds(u8);

impl GcKinds {
  pub const NONE: GcKinds = GcKinds(0);
  pub const ALL: GcKinds = GcKinds(7);

  /// Decodes a bit mask. Bits outside the three known kinds are ignored.
  #[inline]
  pub const fn from_bits(bits: u8) -> Self {
    GcKinds(bits & Self::ALL.0)
  }

  #[inline]
  pub const fn bits(self) -> u8 {
    self.0
  }

  #[inline]
  pub const fn contains(self, kind: GcKind) -> bool {
    self.0 & kind.bit() != 0
  }

  #[inline]
  pub const fn with(self, kind: GcKind) -> Self {
    GcKinds(self.0 | kind.bit())
  }

  #[inline]
  pub const fn is_empty(self) -> bool {
    self.0 == 0
  }

  /// True when a collection pass should remove expired keys.
  #[inline]
  pub const fn reclaims_expired(self) -> bool {
    self.contains(GcKind::Ttl) || self.contains(GcKind::Lfru)
  }

  /// True when a collection pass should evict the stalest keys down to the
  /// cache capacity.
  #[inline]
  pub const fn evicts_by_recency(self) -> bool {
    self.contains(GcKind::Lru) || self.contains(GcKind::Lfru)
  }

  pub fn iter(self) -> impl Iterator<Item = GcKind> {
    GcKind::VARIANTS
      .into_iter()
      .filter(move |&kind| self.contains(kind))
  }
}

impl From<GcKind> for GcKinds {
  fn from(kind: GcKind) -> Self {
    GcKinds(kind.bit())
  }
}

impl FromIterator<GcKind> for GcKinds {
  fn from_iter<I: IntoIterator<Item = GcKind>>(iter: I) -> Self {
    iter.into_iter().fold(GcKinds::NONE, GcKinds::with)
  }
}

impl fmt::Debug for GcKinds {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.iter()).finish()
  }
}

#[cfg(feature = "serde")]
impl Serialize for GcKinds {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(self.0)
  }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for GcKinds {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    // Accepts either the raw bit mask or a list of kind names.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
      Bits(u8),
      Names(Vec<GcKind>),
    }

    Ok(match Repr::deserialize(deserializer)? {
      Repr::Bits(bits) => GcKinds::from_bits(bits),
      Repr::Names(names) => names.into_iter().collect(),
    })
  }
}

type Callback = Box<dyn FnMut() -> Result<(), GcCallbackError> + Send>;

/// Decides, per invocation, whether a reclamation pass should run.
///
/// The collector never looks inside a cache. It only answers "fire now?" with
/// a random draw against its trigger probability, and optionally runs a
/// callback when it fires.
pub struct GarbageCollector {
  kinds: GcKinds,
  probability: f64,
  rng: Box<dyn RngCore + Send>,
  callback: Option<Callback>,
}

impl GarbageCollector {
  /// Creates a collector seeded from the operating system.
  pub fn new(kinds: GcKinds, probability: f64) -> Result<Self, BuildError> {
    if !(0.0..=1.0).contains(&probability) {
      return Err(BuildError::InvalidProbability(probability));
    }
    Ok(Self {
      kinds,
      probability,
      rng: Box::new(StdRng::from_os_rng()),
      callback: None,
    })
  }

  /// A collector with no kinds that never fires.
  pub fn disabled() -> Self {
    Self {
      kinds: GcKinds::NONE,
      probability: 0.0,
      rng: Box::new(StdRng::seed_from_u64(0)),
      callback: None,
    }
  }

  /// Replaces the random source, e.g. with a seeded generator in tests.
  pub fn with_rng<R: RngCore + Send + 'static>(mut self, rng: R) -> Self {
    self.rng = Box::new(rng);
    self
  }

  pub fn with_seed(self, seed: u64) -> Self {
    self.with_rng(StdRng::seed_from_u64(seed))
  }

  /// Sets the routine [`run`](Self::run) invokes when the collector fires.
  pub fn with_callback<F>(mut self, callback: F) -> Self
  where
    F: FnMut() -> Result<(), GcCallbackError> + Send + 'static,
  {
    self.callback = Some(Box::new(callback));
    self
  }

  #[inline]
  pub fn kinds(&self) -> GcKinds {
    self.kinds
  }

  #[inline]
  pub fn bits(&self) -> u8 {
    self.kinds.bits()
  }

  #[inline]
  pub fn contains(&self, kind: GcKind) -> bool {
    self.kinds.contains(kind)
  }

  #[inline]
  pub fn probability(&self) -> f64 {
    self.probability
  }

  #[inline]
  pub fn has_callback(&self) -> bool {
    self.callback.is_some()
  }

  /// Draws a uniform value in `[0, 1)` and fires when it falls under the
  /// trigger probability. Probability `0` never fires and `1` always does.
  pub fn is_triggered(&mut self) -> bool {
    self.rng.random::<f64>() < self.probability
  }

  /// Invokes the callback if one is set and the trigger fires.
  ///
  /// Returns whether the callback ran. An error from the callback is handed
  /// back as-is; the collector does not retry.
  pub fn run(&mut self) -> Result<bool, GcCallbackError> {
    if self.callback.is_none() || !self.is_triggered() {
      return Ok(false);
    }
    if let Some(callback) = self.callback.as_mut() {
      callback()?;
    }
    Ok(true)
  }
}

impl Default for GarbageCollector {
  fn default() -> Self {
    Self::disabled()
  }
}

impl fmt::Debug for GarbageCollector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("GarbageCollector")
      .field("kinds", &self.kinds)
      .field("probability", &self.probability)
      .field("has_callback", &self.callback.is_some())
      .finish_non_exhaustive()
  }
}
