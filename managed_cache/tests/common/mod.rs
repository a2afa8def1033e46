#![allow(dead_code)]

use managed_cache::{CacheBuilder, ManagedCache, ManualClock};
use std::time::Duration;

pub const START: u64 = 1_000;
pub const SECS_10: Duration = Duration::from_secs(10);

// A cache whose expiry decisions follow the returned clock.
pub fn cache_with_clock<V>() -> (ManagedCache<&'static str, V>, ManualClock) {
  let clock = ManualClock::new(START);
  let cache = CacheBuilder::new().clock(clock.clone()).build().unwrap();
  (cache, clock)
}

pub fn builder_with_clock<V>() -> (CacheBuilder<&'static str, V>, ManualClock) {
  let clock = ManualClock::new(START);
  (CacheBuilder::new().clock(clock.clone()), clock)
}

pub fn sorted<T: Ord>(mut items: Vec<T>) -> Vec<T> {
  items.sort_unstable();
  items
}
