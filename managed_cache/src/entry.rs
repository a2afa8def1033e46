use crate::time::Timestamp;

use ahash::HashMap;
use std::any::{self, Any};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

/// Bookkeeping a cache writes into values that opt in through
/// [`SupportsCacheMetadata`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMetadata {
  /// Set once the value has been removed from its cache.
  pub is_deleted: bool,
  /// When the value expires, on the owning cache's clock.
  pub expires_at: Option<Timestamp>,
  /// Named counters. The cache maintains `"hits"`.
  pub stats: HashMap<String, u64>,
}

impl EntryMetadata {
  pub const HITS: &'static str = "hits";

  pub(crate) fn with_expiry(expires_at: Option<Timestamp>) -> Self {
    Self {
      expires_at,
      ..Self::default()
    }
  }

  #[inline]
  pub fn is_expired(&self, now: Timestamp) -> bool {
    self.expires_at.is_some_and(|expires_at| now >= expires_at)
  }

  /// Reads a named counter, `0` if it was never bumped.
  pub fn stat(&self, name: &str) -> u64 {
    self.stats.get(name).copied().unwrap_or(0)
  }

  pub(crate) fn bump(&mut self, name: &str) {
    match self.stats.get_mut(name) {
      Some(count) => *count += 1,
      None => {
        self.stats.insert(name.to_owned(), 1);
      }
    }
  }
}

/// Values that carry a slot for [`EntryMetadata`].
///
/// A cache only touches the slot when built with
/// [`CacheBuilder::track_metadata`](crate::CacheBuilder::track_metadata).
pub trait SupportsCacheMetadata {
  fn cache_metadata(&mut self) -> &mut Option<EntryMetadata>;
}

/// A declared item type: decides which values a cache accepts.
pub trait ItemType<V>: Send + Sync {
  /// A human readable name, used in rejection errors.
  fn name(&self) -> &str;

  fn accepts(&self, value: &V) -> bool;
}

/// Accepts dynamically typed values whose concrete type is `T`.
pub struct TypeOf<T: ?Sized>(PhantomData<fn() -> Box<T>>);

impl<T: ?Sized> TypeOf<T> {
  pub fn new() -> Self {
    TypeOf(PhantomData)
  }
}

impl<T: ?Sized> Default for TypeOf<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: ?Sized> fmt::Debug for TypeOf<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("TypeOf").field(&any::type_name::<T>()).finish()
  }
}

macro_rules! impl_type_of {
  ($($container:ty),* $(,)?) => {
    $(
      impl<T: Any> ItemType<$container> for TypeOf<T> {
        fn name(&self) -> &str {
          any::type_name::<T>()
        }

        fn accepts(&self, value: &$container) -> bool {
          (**value).is::<T>()
        }
      }
    )*
  };
}

impl_type_of!(
  Box<dyn Any>,
  Box<dyn Any + Send>,
  Box<dyn Any + Send + Sync>,
  Arc<dyn Any + Send + Sync>,
  Rc<dyn Any>,
);

/// An item type backed by a predicate.
pub struct FnItemType<F> {
  name: String,
  predicate: F,
}

impl<F> FnItemType<F> {
  pub fn new(name: impl Into<String>, predicate: F) -> Self {
    Self {
      name: name.into(),
      predicate,
    }
  }
}

impl<F> fmt::Debug for FnItemType<F> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FnItemType")
      .field("name", &self.name)
      .finish_non_exhaustive()
  }
}

impl<V, F> ItemType<V> for FnItemType<F>
where
  F: Fn(&V) -> bool + Send + Sync,
{
  fn name(&self) -> &str {
    &self.name
  }

  fn accepts(&self, value: &V) -> bool {
    (self.predicate)(value)
  }
}
