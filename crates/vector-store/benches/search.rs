use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use vector_store::{MetadataFilter, Metric, VectorStore, metadata};

const DIM: usize = 384;

// xorshift keeps the corpus reproducible without pulling in rand.
fn corpus(n: usize) -> VectorStore {
    let mut state = 0x9e37_79b9_7f4a_7c15_u64;
    let mut next = || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        #[allow(clippy::cast_precision_loss)]
        let x = (state % 2_000) as f32 / 1_000.0 - 1.0;
        x
    };

    let mut store = VectorStore::new();
    for i in 0..n {
        let vector = (0..DIM).map(|_| next()).collect();
        let meta = metadata([("shard", i % 4)]);
        if let Err(err) = store.insert(format!("doc-{i}"), vector, Some(meta)) {
            panic!("corpus insert failed: {err}");
        }
    }
    store
}

fn bench_full_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_scan");
    let query: Vec<f32> = (0..DIM).map(|i| if i % 3 == 0 { 0.5 } else { -0.25 }).collect();

    for n in [1_000, 10_000] {
        let store = corpus(n);
        group.throughput(Throughput::Elements(n as u64));
        for metric in [Metric::Cosine, Metric::Euclidean, Metric::DotProduct] {
            group.bench_with_input(BenchmarkId::new(metric.name(), n), &store, |b, store| {
                b.iter(|| store.search(black_box(&query), 10, metric, None));
            });
        }

        let filter = MetadataFilter::new().with("shard", 1_usize);
        group.bench_with_input(BenchmarkId::new("cosine_filtered", n), &store, |b, store| {
            b.iter(|| store.search(black_box(&query), 10, Metric::Cosine, Some(&filter)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_full_scan);
criterion_main!(benches);
