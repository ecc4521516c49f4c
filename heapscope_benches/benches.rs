//! Object graph benchmarks
//!
//! 1. **Ingestion**: applying creation and link events to the graph
//! 2. **Collection**: reachability collections over reachable and garbage heaps
//! 3. **Stack**: push/pop churn on the frame chain
//! 4. **Replay**: a full snapshot stream over a recorded trace

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

use heapscope::{
    engine::replay::{ReplayEngine, Trace, TraceEvent},
    AbstractValue, EngineHooks, ObjectGraph, OptionsBuilder, SnapshotStream, ValueId,
};

const SIZES: [u64; 3] = [100, 1_000, 10_000];

// =============================================================================
// Helpers
// =============================================================================

/// A list of `len` objects hanging off the root, followed by `garbage` objects nothing names.
fn build_graph(len: u64, garbage: u64) -> ObjectGraph {
    let mut graph = ObjectGraph::new();

    for id in 1..=len + garbage {
        graph.on_value_created(&AbstractValue::object(id)).unwrap();
    }

    graph.on_link(None, Some(ValueId(1)), "head").unwrap();
    for id in 1..len {
        graph
            .on_link(Some(ValueId(id)), Some(ValueId(id + 1)), "next")
            .unwrap();
    }

    graph
}

fn list_trace(len: u64) -> Trace {
    let mut trace = Trace::new().step(vec![
        TraceEvent::create(AbstractValue::object(1)),
        TraceEvent::link(None, Some(1), "head"),
    ]);

    for id in 2..=len {
        trace = trace.step(vec![
            TraceEvent::create(AbstractValue::object(id)),
            TraceEvent::push(id),
            TraceEvent::link(Some(id - 1), Some(id), "next"),
            TraceEvent::pop(id),
            TraceEvent::CallBoundary,
        ]);
    }

    trace
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_ingestion(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingestion");

    for size in SIZES {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("create_and_link", size), &size, |b, &size| {
            b.iter(|| black_box(build_graph(size, 0)))
        });
    }

    group.finish();
}

fn bench_collection(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection");

    for size in SIZES {
        group.throughput(Throughput::Elements(size));

        group.bench_with_input(BenchmarkId::new("all_reachable", size), &size, |b, &size| {
            b.iter_batched(
                || build_graph(size, 0),
                |mut graph| black_box(graph.collect()),
                BatchSize::LargeInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("half_garbage", size), &size, |b, &size| {
            b.iter_batched(
                || build_graph(size / 2, size / 2),
                |mut graph| black_box(graph.collect()),
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_stack(c: &mut Criterion) {
    let mut group = c.benchmark_group("stack");

    group.bench_function("push_pop_1000", |b| {
        let mut graph = build_graph(1, 0);
        b.iter(|| {
            for _ in 0..1000 {
                graph.on_push(ValueId(1)).unwrap();
            }
            for _ in 0..1000 {
                graph.on_pop(ValueId(1)).unwrap();
            }
            black_box(graph.stack_depth())
        })
    });

    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");
    let options = OptionsBuilder::new().batch_size(100).build();

    for size in [100, 1_000] {
        let source = list_trace(size).to_json().unwrap();

        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("snapshot_stream", size), &source, |b, source| {
            b.iter(|| {
                let stream = SnapshotStream::new(&mut ReplayEngine::new(), source, &options);
                black_box(stream.count())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_ingestion,
    bench_collection,
    bench_stack,
    bench_replay
);
criterion_main!(benches);
