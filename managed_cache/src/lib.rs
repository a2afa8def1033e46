//! A single-owner managed object cache.
//!
//! A [`ManagedCache`] is an identity map with bookkeeping layered on top:
//!
//! - **Recency**: every insert and hit moves a key to the fresh end of an LRU
//!   list.
//! - **Expiry**: entries may carry a TTL. Expiry is advisory; expired entries
//!   keep being served until a collection pass removes them.
//! - **Tags**: entries may carry labels, and a whole label can be invalidated
//!   at once.
//! - **Garbage collection**: a probabilistic trigger decides when a pass runs,
//!   and the configured kinds (TTL, LRU, LFRU) decide what it removes.
//! - **Accounting**: hit and miss counters with a [`CacheStats`] snapshot.
//!
//! A [`CacheRegistry`] hands out named caches built from one template, and a
//! [`SharedCache`] puts a cache behind a mutex for multi-threaded owners.
//!
//! ```
//! use managed_cache::{AddOptions, ManagedCache};
//! use std::time::Duration;
//!
//! let mut cache = ManagedCache::new();
//! cache
//!   .add("session", 42, AddOptions::new().ttl(Duration::from_secs(30)).tag("user:7"))
//!   .unwrap();
//!
//! assert_eq!(cache.get(&"session"), Some(&42));
//! assert_eq!(cache.invalidate_tag("user:7"), 1);
//! assert_eq!(cache.get(&"session"), None);
//! assert_eq!(cache.stats().hits, 1);
//! ```

// Public modules that form the API
pub mod builder;
pub mod cache;
pub mod config;
pub mod entry;
pub mod error;
pub mod gc;
pub mod id;
pub mod metrics;
pub mod registry;
pub mod sync;
pub mod time;

// Index structures, usable on their own
pub mod expiry;
pub mod recency;
pub mod store;
pub mod tags;

// Re-export the primary user-facing types for convenience
pub use builder::CacheBuilder;
pub use cache::{AddOptions, CollectReport, ManagedCache};
pub use config::{CacheConfig, GcConfig};
pub use entry::{EntryMetadata, FnItemType, ItemType, SupportsCacheMetadata, TypeOf};
pub use error::{BuildError, CacheError, GcCallbackError};
pub use gc::{GarbageCollector, GcKind, GcKinds};
pub use id::SimpleIdGenerator;
pub use metrics::{CacheStats, HitsMisses};
pub use registry::{CacheRegistry, RegistryStats};
pub use sync::SharedCache;
pub use time::{Clock, ManualClock, MonotonicClock, Timestamp};
