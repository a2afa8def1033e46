use once_cell::sync::Lazy;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// The single, static reference point for the monotonic clock.
// It is initialized lazily on its first use.
static CACHE_EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// A point in time, in whole seconds on a [`Clock`].
///
/// Expiry buckets are keyed by this value, so every key expiring within the
/// same second shares one bucket.
pub type Timestamp = u64;

/// A source of the current time for expiry decisions.
pub trait Clock: Send + Sync + fmt::Debug {
  fn now(&self) -> Timestamp;
}

/// The default clock: whole seconds elapsed since the process-wide cache epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
  #[inline]
  fn now(&self) -> Timestamp {
    now_duration().as_secs()
  }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// give another to the cache.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
  now: Arc<AtomicU64>,
}

impl ManualClock {
  /// Creates a clock reading `start`.
  pub fn new(start: Timestamp) -> Self {
    Self {
      now: Arc::new(AtomicU64::new(start)),
    }
  }

  /// Sets the clock to an absolute timestamp.
  pub fn set(&self, now: Timestamp) {
    self.now.store(now, Ordering::Relaxed);
  }

  /// Moves the clock forward, returning the new reading. Saturates at
  /// `Timestamp::MAX`.
  pub fn advance(&self, by: Duration) -> Timestamp {
    let secs = ttl_secs(by);
    let (Ok(previous) | Err(previous)) = self
      .now
      .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |now| {
        Some(now.saturating_add(secs))
      });
    previous.saturating_add(secs)
  }
}

impl Clock for ManualClock {
  #[inline]
  fn now(&self) -> Timestamp {
    self.now.load(Ordering::Relaxed)
  }
}

/// The current time as a `Duration` since the cache epoch.
#[inline]
pub(crate) fn now_duration() -> Duration {
  Instant::now().saturating_duration_since(*CACHE_EPOCH)
}

/// Converts a TTL into whole seconds, rounding any fractional second up so a
/// sub-second TTL never expires immediately.
#[inline]
pub(crate) fn ttl_secs(ttl: Duration) -> u64 {
  let secs = ttl.as_secs();
  if ttl.subsec_nanos() > 0 {
    secs.saturating_add(1)
  } else {
    secs
  }
}
