//! Viewer benchmarks for rowmap
//!
//! Measures the two hot paths of the remapping layer: hash-keyed lookup
//! against a populated dictionary, and logical-row reads through the
//! blocked viewer's slot resolution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rowmap::{blocked, hash, Cursor, Property, Row, Value, View, Viewer};

fn value(k: i64) -> Cursor {
    Row::new()
        .with(Property::int("k"), Value::Int(k))
        .with(Property::bytes("v"), Value::Bytes(b"payload".to_vec()))
        .into_cursor()
}

fn key(k: i64) -> Cursor {
    Row::new()
        .with(Property::int("k"), Value::Int(k))
        .into_cursor()
}

fn bench_hash_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_lookup");

    for count in [1_000i64, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("hit", count), count, |b, &count| {
            let base = View::with_properties(vec![Property::int("k"), Property::bytes("v")]);
            let mut v = hash(base, 1, None).unwrap();
            for k in 0..count {
                v.insert(v.size(), &value(k), 1).unwrap();
            }
            b.iter(|| {
                for k in 0..count {
                    black_box(v.lookup(&key(k)).unwrap());
                }
            });
        });
    }

    group.finish();
}

fn bench_hash_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_insert");

    for count in [1_000i64, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("distinct", count), count, |b, &count| {
            b.iter(|| {
                let base = View::with_properties(vec![Property::int("k"), Property::bytes("v")]);
                let mut v = hash(base, 1, None).unwrap();
                for k in 0..count {
                    v.insert(v.size(), &value(k), 1).unwrap();
                }
                black_box(v.size())
            });
        });
    }

    group.finish();
}

fn bench_blocked_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("blocked_read");

    for count in [2_500usize, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("sequential", count), count, |b, &count| {
            let base = View::with_properties(vec![Property::view("_B")]);
            let mut v = blocked(base).unwrap();
            for n in 0..count {
                let row = Row::new().with(Property::int("n"), Value::Int(n as i64));
                v.insert(v.size(), &row.into_cursor(), 1).unwrap();
            }
            b.iter(|| {
                for row in 0..count {
                    black_box(v.get(row, 0).unwrap());
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_hash_lookup,
    bench_hash_insert,
    bench_blocked_read
);
criterion_main!(benches);
