//! Benchmarks for cache key derivation.
//!
//! Every report request hashes its payload before the cache lookup, so this
//! sits on the hot path of cache hits.
//!
//! ## Run
//! ```bash
//! cargo bench --bench bench_cache_key
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use quota_guard_lib::cache::{hash_value, stable_stringify, CacheKey};
use serde_json::{json, Value};
use std::hint::black_box;

fn report_payload(dimensions: usize) -> Value {
    json!({
        "dateRanges": [{"startDate": "28daysAgo", "endDate": "today"}],
        "metrics": [{"name": "sessions"}, {"name": "activeUsers"}, {"name": "screenPageViews"}],
        "dimensions": (0..dimensions).map(|i| json!({"name": format!("customEvent:dim_{i}")})).collect::<Vec<_>>(),
        "limit": 10000,
        "keepEmptyRows": false,
    })
}

fn bench_stable_stringify(c: &mut Criterion) {
    let mut group = c.benchmark_group("stable_stringify");
    for dimensions in [1usize, 8, 64] {
        let payload = report_payload(dimensions);
        group.bench_with_input(BenchmarkId::from_parameter(dimensions), &payload, |b, p| {
            b.iter(|| stable_stringify(black_box(p)))
        });
    }
    group.finish();
}

fn bench_cache_key(c: &mut Criterion) {
    let payload = report_payload(8);
    c.bench_function("hash_value", |b| b.iter(|| hash_value(black_box(&payload))));
    c.bench_function("cache_key_report", |b| {
        b.iter(|| CacheKey::report(black_box("tenant-1"), Some("properties/123"), black_box(&payload)))
    });
}

criterion_group!(benches, bench_stable_stringify, bench_cache_key);
criterion_main!(benches);
