//! Trace computation benchmarks.
//!
//! Measures the cost of propagating cycle weights through random graphs of
//! increasing size. Each iteration works on a fresh clone so cached traces
//! are never reused.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};

use fine2x3_benches::{
    error::BenchSetupError,
    params::TracesBenchParams,
    source::{RandomGraphConfig, random_graphs},
};

const SEED: u64 = 42;

const GRAPHS_PER_SIZE: usize = 32;

const VERTEX_COUNTS: &[usize] = &[4, 8, 16, 31];

fn traces_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("traces");

    for &vertex_count in VERTEX_COUNTS {
        let graphs = random_graphs(&RandomGraphConfig {
            vertex_count,
            graph_count: GRAPHS_PER_SIZE,
            seed: SEED,
        })?;
        let params = TracesBenchParams {
            vertex_count,
            trace_count: vertex_count,
        };

        group.bench_with_input(
            BenchmarkId::from_parameter(params),
            &graphs,
            |b, inputs| {
                b.iter_batched_ref(
                    || inputs.clone(),
                    |batch| {
                        for graph in batch.iter_mut() {
                            let _traces = graph.traces(params.trace_count);
                        }
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
    Ok(())
}

fn traces(c: &mut Criterion) {
    if let Err(err) = traces_impl(c) {
        panic!("traces benchmark setup failed: {err}");
    }
}

criterion_group!(benches, traces);
criterion_main!(benches);
