use ahash::{HashMap, HashMapExt, HashSet};
use std::fmt;
use std::hash::Hash;

/// A symmetric index between tags and the keys carrying them.
///
/// A `(tag, key)` pair is present in the tag side iff it is present in the key
/// side, and neither side keeps an empty set once a call returns.
pub struct TagIndex<K> {
  tag_keys: HashMap<String, HashSet<K>>,
  key_tags: HashMap<K, HashSet<String>>,
}

impl<K> fmt::Debug for TagIndex<K> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TagIndex")
      .field("tags", &self.tag_keys.len())
      .field("keys", &self.key_tags.len())
      .finish()
  }
}

impl<K> Default for TagIndex<K> {
  fn default() -> Self {
    Self {
      tag_keys: HashMap::new(),
      key_tags: HashMap::new(),
    }
  }
}

impl<K: Eq + Hash + Clone> TagIndex<K> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Attaches `tag` to `key`. Returns `false` if the pair already existed.
  pub fn set_tag(&mut self, key: K, tag: impl Into<String>) -> bool {
    let tag = tag.into();
    let added = self
      .tag_keys
      .entry(tag.clone())
      .or_default()
      .insert(key.clone());
    self.key_tags.entry(key).or_default().insert(tag);
    added
  }

  /// Detaches `tag` from `key` on both sides. Returns `false` if the pair
  /// did not exist, so repeated calls are harmless.
  pub fn remove_tag(&mut self, key: &K, tag: &str) -> bool {
    if !self.detach_from_tag(tag, key) {
      return false;
    }
    if let Some(tags) = self.key_tags.get_mut(key) {
      tags.remove(tag);
      if tags.is_empty() {
        self.key_tags.remove(key);
      }
    }
    true
  }

  // Removes the key from one tag's key set only. The key side is the
  // caller's responsibility.
  fn detach_from_tag(&mut self, tag: &str, key: &K) -> bool {
    let Some(keys) = self.tag_keys.get_mut(tag) else {
      return false;
    };
    let removed = keys.remove(key);
    if keys.is_empty() {
      self.tag_keys.remove(tag);
    }
    removed
  }

  /// Detaches `key` from every tag it carries, returning how many tags that
  /// was.
  pub fn remove_key(&mut self, key: &K) -> usize {
    let Some(tags) = self.key_tags.remove(key) else {
      return 0;
    };
    for tag in &tags {
      self.detach_from_tag(tag, key);
    }
    tags.len()
  }

  /// The tags attached to `key`, in no particular order.
  pub fn tags_for(&self, key: &K) -> impl Iterator<Item = &str> + '_ {
    self
      .key_tags
      .get(key)
      .into_iter()
      .flatten()
      .map(String::as_str)
  }

  /// The keys carrying `tag`, in no particular order.
  pub fn keys_for(&self, tag: &str) -> impl Iterator<Item = &K> + '_ {
    self.tag_keys.get(tag).into_iter().flatten()
  }

  #[inline]
  pub fn has_tag(&self, tag: &str) -> bool {
    self.tag_keys.contains_key(tag)
  }

  #[inline]
  pub fn has_key(&self, key: &K) -> bool {
    self.key_tags.contains_key(key)
  }

  /// Every tag currently attached to at least one key.
  pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
    self.tag_keys.keys().map(String::as_str)
  }

  /// The number of distinct tags.
  #[inline]
  pub fn len(&self) -> usize {
    self.tag_keys.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.tag_keys.is_empty()
  }

  pub fn clear(&mut self) {
    self.tag_keys.clear();
    self.key_tags.clear();
  }
}
