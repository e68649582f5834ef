use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use itemstore::{JsonStore, NewRecord, RecordEngine};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

const RECORDS: i64 = 100;

fn seeded_store(dir: &TempDir) -> JsonStore {
    let store = JsonStore::open(dir.path().join("products.json")).unwrap();
    for i in 0..RECORDS {
        store
            .append(NewRecord { name: format!("item{}", i), quantity: i, price: 1.25 })
            .unwrap();
    }
    store
}

fn append_bench(c: &mut Criterion) {
    c.bench_function("append", |b| {
        b.iter_batched(
            || {
                let dir = TempDir::new().unwrap();
                let store = seeded_store(&dir);
                (dir, store)
            },
            |(_dir, store)| {
                store
                    .append(NewRecord { name: "bench".to_string(), quantity: 3, price: 9.99 })
                    .unwrap();
            },
            BatchSize::PerIteration,
        )
    });
}

fn patch_bench(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir);
    let mut rng = SmallRng::seed_from_u64(7);

    c.bench_function("patch_price", |b| {
        b.iter(|| {
            let index = rng.gen_range(0..RECORDS);
            let price = rng.gen_range(1..1000).to_string();
            store.patch_field(index, "price".to_string(), price).unwrap();
        })
    });
}

fn read_bench(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir);

    c.bench_function("read", |b| b.iter(|| store.read()));
}

criterion_group!(benches, append_bench, patch_bench, read_bench);
criterion_main!(benches);
