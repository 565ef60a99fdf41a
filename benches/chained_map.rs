use chmap::ChainedHashMap;
use criterion::{criterion_group, criterion_main, Criterion};
use rand::Rng;
use std::time::Instant;

fn insert(c: &mut Criterion) {
    c.bench_function("ChainedHashMap: insert", |b| {
        b.iter_custom(|iters| {
            let hashmap: ChainedHashMap<u64, u64> = ChainedHashMap::new(1024).unwrap();
            let start = Instant::now();
            for i in 0..iters {
                assert!(hashmap.insert(i, i).is_none());
            }
            start.elapsed()
        })
    });
}

fn read(c: &mut Criterion) {
    c.bench_function("ChainedHashMap: read", |b| {
        b.iter_custom(|iters| {
            let hashmap: ChainedHashMap<u64, u64> = ChainedHashMap::new(1024).unwrap();
            for i in 0..iters {
                assert!(hashmap.insert(i, i).is_none());
            }
            let start = Instant::now();
            for i in 0..iters {
                assert_eq!(hashmap.read(&i, |_, v| *v == i), Some(true));
            }
            start.elapsed()
        })
    });
}

fn read_random(c: &mut Criterion) {
    c.bench_function("ChainedHashMap: read, random keys", |b| {
        let hashmap: ChainedHashMap<u64, u64> = ChainedHashMap::new(4096).unwrap();
        for i in 0..65536 {
            assert!(hashmap.insert(i, i).is_none());
        }
        let mut rng = rand::rng();
        b.iter_custom(|iters| {
            let keys: Vec<u64> = (0..iters).map(|_| rng.random_range(0..65536)).collect();
            let start = Instant::now();
            for k in &keys {
                assert!(hashmap.contains(k));
            }
            start.elapsed()
        })
    });
}

fn resize(c: &mut Criterion) {
    c.bench_function("ChainedHashMap: resize", |b| {
        b.iter_custom(|iters| {
            let hashmap: ChainedHashMap<u64, u64> = ChainedHashMap::new(16).unwrap();
            for i in 0..65536 {
                assert!(hashmap.insert(i, i).is_none());
            }
            let start = Instant::now();
            for i in 0..iters {
                let num_buckets = if i % 2 == 0 { 4096 } else { 16 };
                assert!(hashmap.resize(num_buckets).is_ok());
            }
            start.elapsed()
        })
    });
}

criterion_group!(chained_map, insert, read, read_random, resize);
criterion_main!(chained_map);
