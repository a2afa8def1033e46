use managed_cache::{AddOptions, CacheBuilder, GcKind, ManagedCache, ManualClock};
use std::time::Duration;

fn main() {
  // A manual clock lets the example move time forward instantly.
  let clock = ManualClock::new(0);
  let mut cache: ManagedCache<&str, String> = CacheBuilder::new()
    .clock(clock.clone())
    .gc_kinds([GcKind::Ttl, GcKind::Lru].into_iter().collect::<managed_cache::GcKinds>())
    .capacity(3)
    .build()
    .expect("valid configuration");

  cache
    .add("greeting", "hello".to_owned(), AddOptions::default())
    .expect("untyped cache accepts everything");
  cache
    .add(
      "session",
      "token-123".to_owned(),
      AddOptions::new().ttl(Duration::from_secs(30)).tag("user:7"),
    )
    .expect("untyped cache accepts everything");
  cache
    .add("profile", "alice".to_owned(), AddOptions::new().tag("user:7"))
    .expect("untyped cache accepts everything");

  println!("greeting = {:?}", cache.get(&"greeting"));
  println!("missing  = {:?}", cache.get(&"missing"));

  let name = cache
    .get_or_fetch("motd", || "be kind".to_owned(), AddOptions::default())
    .expect("untyped cache accepts everything");
  println!("motd     = {name}");

  clock.advance(Duration::from_secs(31));
  println!("expired before collection: {:?}", cache.expired_keys());

  let report = cache.collect();
  println!("collection: {report:?}");
  println!("remaining keys: {:?}", cache.least_recent(usize::MAX));

  println!("invalidated {} entries tagged user:7", cache.invalidate_tag("user:7"));
  println!("{:#?}", cache.stats());
}
