use managed_cache::{AddOptions, CacheBuilder, CacheError, FnItemType, ManagedCache, TypeOf};
use pretty_assertions::assert_eq;
use std::any::Any;
use std::sync::Arc;

fn numeric_cache() -> ManagedCache<&'static str, Box<dyn Any>> {
  CacheBuilder::new()
    .item_type(TypeOf::<i64>::new())
    .build()
    .unwrap()
}

#[test]
fn test_declared_type_rejects_other_values() {
  let mut cache = numeric_cache();

  let err = cache
    .add("x", Box::new(String::from("not a number")), AddOptions::default())
    .unwrap_err();

  assert_eq!(
    err,
    CacheError::TypeMismatch {
      expected: "i64".to_owned()
    }
  );
  assert!(!cache.has(&"x"));
  assert!(cache.least_recent(10).is_empty(), "nothing written on rejection");
}

#[test]
fn test_declared_type_accepts_matching_values() {
  let mut cache = numeric_cache();
  cache.add("x", Box::new(42i64), AddOptions::default()).unwrap();

  let value = cache.get(&"x").and_then(|value| value.downcast_ref::<i64>());
  assert_eq!(value, Some(&42));
}

#[test]
fn test_rejected_overwrite_keeps_previous_entry() {
  let mut cache = numeric_cache();
  cache
    .add("x", Box::new(1i64), AddOptions::new().tag("kept"))
    .unwrap();

  assert!(cache.add("x", Box::new(1.5f32), AddOptions::new().tag("dropped")).is_err());

  assert_eq!(cache.peek(&"x").and_then(|value| value.downcast_ref::<i64>()), Some(&1));
  assert_eq!(cache.tags_for(&"x").collect::<Vec<_>>(), vec!["kept"]);
}

#[test]
fn test_loaded_value_is_checked_too() {
  let mut cache = numeric_cache();
  let result = cache
    .get_or_fetch("x", || Box::new("text") as Box<dyn Any>, AddOptions::default())
    .map(|_| ());

  assert!(matches!(result, Err(CacheError::TypeMismatch { .. })));
  assert!(!cache.has(&"x"));
}

#[test]
fn test_predicate_item_type() {
  let mut cache: ManagedCache<u32, i32> = CacheBuilder::new()
    .item_type(FnItemType::new("non-negative", |value: &i32| *value >= 0))
    .build()
    .unwrap();

  assert!(cache.add(1, 5, AddOptions::default()).is_ok());
  let err = cache.add(2, -5, AddOptions::default()).unwrap_err();
  assert_eq!(err.to_string(), "value rejected: cache only accepts items of type `non-negative`");
  assert_eq!(cache.item_type().map(|item_type| item_type.name()), Some("non-negative"));
}

#[test]
fn test_shared_values_through_arc() {
  let mut cache: ManagedCache<u8, Arc<dyn Any + Send + Sync>> = CacheBuilder::new()
    .item_type(TypeOf::<String>::new())
    .build()
    .unwrap();

  assert!(cache.add(1, Arc::new(String::from("ok")), AddOptions::default()).is_ok());
  assert!(cache.add(2, Arc::new(7u8), AddOptions::default()).is_err());
  assert_eq!(cache.len(), 1);
}
