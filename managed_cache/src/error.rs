use thiserror::Error;

/// Errors returned by cache operations.
///
/// Absence is never an error: lookups and removals report it through
/// `Option` or `bool` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
  /// The cache was built with a declared item type and the value offered to
  /// `add` (or produced by a loader) is not of that type. Nothing was written.
  #[error("value rejected: cache only accepts items of type `{expected}`")]
  TypeMismatch { expected: String },
}

/// Errors that can occur when building a cache or a garbage collector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
  /// A capacity bound of zero was requested. Leave the capacity unset for an
  /// unbounded cache.
  #[error("cache capacity cannot be zero")]
  ZeroCapacity,
  /// The garbage collection trigger probability is outside `[0, 1]` or NaN.
  #[error("gc trigger probability must be within [0, 1], got {0}")]
  InvalidProbability(f64),
}

/// The error type a garbage collector callback may fail with.
///
/// It is handed back to the caller of `GarbageCollector::run` untouched.
pub type GcCallbackError = Box<dyn std::error::Error + Send + Sync>;
