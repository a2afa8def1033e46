use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use managed_cache::{AddOptions, CacheBuilder, GcKind, ManagedCache, ManualClock};
use rand::prelude::{SliceRandom, StdRng};
use rand::SeedableRng;
use std::time::Duration;

const SIZES: [u64; 3] = [1_000, 10_000, 100_000];

fn populated(num_items: u64) -> ManagedCache<u64, u64> {
  let mut cache = ManagedCache::new();
  for i in 0..num_items {
    cache.add(i, i, AddOptions::default()).unwrap();
  }
  cache
}

fn shuffled_keys(range: std::ops::Range<u64>) -> Vec<u64> {
  let mut keys: Vec<u64> = range.collect();
  let mut rng = StdRng::from_seed([0; 32]);
  keys.shuffle(&mut rng);
  keys
}

fn bench_get(c: &mut Criterion) {
  let mut group = c.benchmark_group("get");
  for num_items in SIZES {
    group.throughput(Throughput::Elements(num_items));

    let hit_keys = shuffled_keys(0..num_items);
    group.bench_with_input(BenchmarkId::new("hit", num_items), &num_items, |b, &n| {
      let mut cache = populated(n);
      b.iter(|| {
        for key in &hit_keys {
          black_box(cache.get(key));
        }
      });
    });

    let miss_keys = shuffled_keys(num_items..2 * num_items);
    group.bench_with_input(BenchmarkId::new("miss", num_items), &num_items, |b, &n| {
      let mut cache = populated(n);
      b.iter(|| {
        for key in &miss_keys {
          black_box(cache.get(key));
        }
      });
    });
  }
  group.finish();
}

fn bench_add(c: &mut Criterion) {
  let mut group = c.benchmark_group("add");
  for num_items in SIZES {
    group.throughput(Throughput::Elements(num_items));
    let keys = shuffled_keys(0..num_items);

    group.bench_with_input(BenchmarkId::new("plain", num_items), &keys, |b, keys| {
      b.iter(|| {
        let mut cache = ManagedCache::new();
        for &key in keys {
          cache.add(key, key, AddOptions::default()).unwrap();
        }
        cache
      });
    });

    group.bench_with_input(BenchmarkId::new("ttl_and_tag", num_items), &keys, |b, keys| {
      b.iter(|| {
        let mut cache = ManagedCache::new();
        for &key in keys {
          let options = AddOptions::new()
            .ttl(Duration::from_secs(key % 60))
            .tag(if key % 2 == 0 { "even" } else { "odd" });
          cache.add(key, key, options).unwrap();
        }
        cache
      });
    });
  }
  group.finish();
}

fn bench_collect(c: &mut Criterion) {
  let mut group = c.benchmark_group("collect");
  for num_items in SIZES {
    group.throughput(Throughput::Elements(num_items));
    group.bench_with_input(BenchmarkId::new("ttl_half_expired", num_items), &num_items, |b, &n| {
      b.iter_batched(
        || {
          let clock = ManualClock::new(0);
          let mut cache = CacheBuilder::new()
            .clock(clock.clone())
            .gc_kinds(GcKind::Ttl)
            .build()
            .unwrap();
          for key in 0..n {
            let ttl = if key % 2 == 0 { 1 } else { 3_600 };
            cache
              .add(key, key, AddOptions::new().ttl(Duration::from_secs(ttl)))
              .unwrap();
          }
          clock.advance(Duration::from_secs(10));
          cache
        },
        |mut cache: ManagedCache<u64, u64>| black_box(cache.collect()),
        criterion::BatchSize::LargeInput,
      );
    });
  }
  group.finish();
}

criterion_group!(benches, bench_get, bench_add, bench_collect);
criterion_main!(benches);
