use ahash::{HashMap, HashMapExt};
use generational_arena::{Arena, Index};
use std::hash::Hash;
use std::iter;

#[derive(Debug)]
struct Node<K> {
  key: K,
  // Towards the stalest end.
  next: Option<Index>,
  // Towards the freshest end.
  prev: Option<Index>,
}

/// Keys ordered by when they were last touched (inserted or accessed).
///
/// The list only exposes the ordering. It never evicts on its own; the owning
/// cache decides whether and when to act on [`first`](Self::first).
#[derive(Debug)]
pub struct RecencyList<K> {
  // Arena stores all nodes contiguously.
  nodes: Arena<Node<K>>,
  // O(1) lookup of a key to its node index in the arena.
  lookup: HashMap<K, Index>,
  // Head is the most recently touched key.
  head: Option<Index>,
  // Tail is the least recently touched key.
  tail: Option<Index>,
}

impl<K> Default for RecencyList<K> {
  fn default() -> Self {
    Self {
      nodes: Arena::new(),
      lookup: HashMap::new(),
      head: None,
      tail: None,
    }
  }
}

impl<K: Eq + Hash + Clone> RecencyList<K> {
  pub fn new() -> Self {
    Self::default()
  }

  // Detaches a node from the chain, patching head and tail when it sat at
  // either end. The node stays in the arena and the lookup.
  fn unlink(&mut self, index: Index) {
    let Node { prev, next, .. } = self.nodes[index];
    match prev {
      Some(fresher) => self.nodes[fresher].next = next,
      None => self.head = next,
    }
    match next {
      Some(staler) => self.nodes[staler].prev = prev,
      None => self.tail = prev,
    }
  }

  // Makes a detached node the freshest one.
  fn link_as_head(&mut self, index: Index) {
    let staler = self.head.replace(index);
    let node = &mut self.nodes[index];
    node.prev = None;
    node.next = staler;
    match staler {
      Some(staler) => self.nodes[staler].prev = Some(index),
      None => self.tail = Some(index),
    }
  }

  #[inline]
  pub fn contains(&self, key: &K) -> bool {
    self.lookup.contains_key(key)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.lookup.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.lookup.is_empty()
  }

  /// Appends `key` as the most recently touched entry.
  ///
  /// Returns `false` without moving anything if the key is already tracked.
  pub fn add(&mut self, key: K) -> bool {
    if self.contains(&key) {
      return false;
    }
    let index = self.nodes.insert(Node {
      key: key.clone(),
      next: None,
      prev: None,
    });
    self.lookup.insert(key, index);
    self.link_as_head(index);
    true
  }

  pub fn remove(&mut self, key: &K) -> bool {
    match self.lookup.remove(key) {
      Some(index) => {
        self.unlink(index);
        self.nodes.remove(index);
        true
      }
      None => false,
    }
  }

  /// Marks a tracked key as the most recently touched.
  ///
  /// Returns `false` if the key is not tracked, in which case nothing moved.
  pub fn update(&mut self, key: &K) -> bool {
    match self.lookup.get(key) {
      Some(&index) => {
        if self.head != Some(index) {
          self.unlink(index);
          self.link_as_head(index);
        }
        true
      }
      None => false,
    }
  }

  /// Touches `key`, tracking it first if needed. Always succeeds.
  pub fn upsert(&mut self, key: K) -> bool {
    if !self.update(&key) {
      self.add(key);
    }
    true
  }

  /// The `count` least recently touched keys, stalest first.
  pub fn first(&self, count: usize) -> Vec<K> {
    self.iter().take(count).cloned().collect()
  }

  /// The `count` most recently touched keys, in touch order (the freshest
  /// key is last).
  pub fn last(&self, count: usize) -> Vec<K> {
    let mut keys: Vec<K> = self
      .walk(self.head, |node| node.next)
      .take(count)
      .cloned()
      .collect();
    keys.reverse();
    keys
  }

  /// Iterates from the stalest to the freshest key.
  pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
    self.walk(self.tail, |node| node.prev)
  }

  fn walk(
    &self,
    start: Option<Index>,
    step: fn(&Node<K>) -> Option<Index>,
  ) -> impl Iterator<Item = &K> + '_ {
    iter::successors(start, move |&index| step(&self.nodes[index])).map(move |index| &self.nodes[index].key)
  }

  pub fn clear(&mut self) {
    self.nodes.clear();
    self.lookup.clear();
    self.head = None;
    self.tail = None;
  }
}
