//! Hot-path benchmark suite.
//!
//! Benchmarks the three per-message costs of a connection:
//! - Event dispatch with 1, 8 and 64 handlers on one identity
//! - Payload conversion, strict and field-wise
//! - Command round trip over the in-memory transport
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use devtools_link::{Connection, EventIdentity, EventRouter, MemoryTransport, RawHandler, convert};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::runtime::Runtime;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const HANDLER_COUNTS: &[usize] = &[1, 8, 64];

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(dead_code)]
struct Frame {
    id: String,
    url: String,
    loader_id: String,
    parent_id: Option<String>,
}

// ============================================================================
// Benchmark: Event Dispatch
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let identity = EventIdentity::scoped("Page", "frameNavigated", "S1");
    let payload = json!({ "frame": { "id": "F1", "url": "https://example.com/" } });

    for &count in HANDLER_COUNTS {
        let router = Arc::new(EventRouter::new());
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..count {
            let hits = Arc::clone(&hits);
            let handler: RawHandler = Arc::new(move |_: &Value| {
                hits.fetch_add(1, Ordering::Relaxed);
            });
            router.on(identity.clone(), handler);
        }

        group.bench_with_input(BenchmarkId::new("handlers", count), &count, |b, _| {
            b.iter(|| router.dispatch(black_box(&identity), black_box(&payload)));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Conversion
// ============================================================================

fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");

    let exact = json!({ "id": "F1", "url": "https://example.com/", "loaderId": "L1" });
    let mismatched = json!({ "id": 7, "url": "https://example.com/", "loaderId": "L1", "parentId": [] });

    group.bench_function("strict", |b| {
        b.iter(|| convert::<Frame>(black_box(exact.clone())));
    });

    group.bench_function("field_wise", |b| {
        b.iter(|| convert::<Frame>(black_box(mismatched.clone())));
    });

    group.finish();
}

// ============================================================================
// Benchmark: Command Round Trip
// ============================================================================

fn bench_round_trip(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let _guard = rt.enter();

    let (transport, mut remote) = MemoryTransport::pair();
    let connection = Connection::new(transport);

    rt.spawn(async move {
        while let Some(request) = remote.next_request().await {
            remote.respond(&request, json!({ "frameId": "F1" }));
        }
    });

    c.bench_function("round_trip", |b| {
        b.to_async(&rt).iter(|| async {
            connection
                .send("Page", "navigate", Some(json!({ "url": "about:blank" })), None)
                .await
                .expect("response")
        });
    });
}

criterion_group!(benches, bench_dispatch, bench_convert, bench_round_trip);
criterion_main!(benches);
