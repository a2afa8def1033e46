use std::collections::BTreeSet;

/// Hands out positive integer ids, reusing freed ones before growing.
///
/// Freed ids below the high-water mark are kept in a pool and handed out
/// lowest first. Freeing the high-water mark itself shrinks it instead, along
/// with any pooled ids directly beneath it, so the pool only ever holds ids
/// below [`last_id`](Self::last_id).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleIdGenerator {
  last: u64,
  free: BTreeSet<u64>,
}

impl SimpleIdGenerator {
  pub fn new() -> Self {
    Self::default()
  }

  /// The next id: the lowest freed id if any, otherwise a fresh one.
  pub fn allocate(&mut self) -> u64 {
    if let Some(id) = self.free.pop_first() {
      return id;
    }
    self.last += 1;
    self.last
  }

  /// Returns an id to the generator. Returns `false` for ids that were never
  /// handed out or are already free.
  pub fn free(&mut self, id: u64) -> bool {
    if id == 0 || id > self.last {
      return false;
    }
    if id < self.last {
      return self.free.insert(id);
    }

    self.last -= 1;
    while self.last > 0 && self.free.remove(&self.last) {
      self.last -= 1;
    }
    true
  }

  pub fn reset(&mut self) {
    self.last = 0;
    self.free.clear();
  }

  /// The highest id currently handed out, `0` if none.
  #[inline]
  pub fn last_id(&self) -> u64 {
    self.last
  }

  /// The number of ids currently handed out.
  #[inline]
  pub fn len(&self) -> usize {
    self.last as usize - self.free.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl Iterator for SimpleIdGenerator {
  type Item = u64;

  fn next(&mut self) -> Option<u64> {
    Some(self.allocate())
  }
}
