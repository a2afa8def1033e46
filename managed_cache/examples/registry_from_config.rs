use managed_cache::{AddOptions, CacheConfig, CacheRegistry};
use std::time::Duration;

const CONFIG: &str = r#"{
  "gc": { "kinds": ["ttl", "lru"], "probability": 0.5, "seed": 7 },
  "capacity": 100
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let config: CacheConfig = serde_json::from_str(CONFIG)?;
  let mut registry = CacheRegistry::<u32, String>::from_config(&config)?;

  for id in 0..10 {
    registry
      .get_or_create("users")
      .add(id, format!("user-{id}"), AddOptions::new().ttl(Duration::from_secs(60)))?;
  }
  for id in 0..5 {
    registry
      .get_or_create("orders")
      .add(id, format!("order-{id}"), AddOptions::new().tag("pending"))?;
  }

  for id in 0..15 {
    registry.get_or_create("users").get(&id);
  }

  let fired = (0..4).map(|_| registry.run_gc()).sum::<usize>();
  println!("collection passes fired: {fired}");
  println!("{}", serde_json::to_string_pretty(&registry.stats())?);
  Ok(())
}
