//! Enumeration walker benchmarks.
//!
//! Runs the walker to completion on the calling thread for small vertex caps,
//! with and without edge splits.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]
use std::ops::ControlFlow;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use fine2x3_benches::{error::BenchSetupError, params::EnumBenchParams};
use fine2x3_core::{EnumOpts, WalkerVariant};

const VERTEX_CAPS: &[usize] = &[3, 4, 5];

fn enumerate_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("enumerate");
    group.sample_size(10);

    for variant in [WalkerVariant::Minimal, WalkerVariant::WithSplits] {
        for &vertex_max in VERTEX_CAPS {
            // Validate the options once so setup errors surface before timing.
            EnumOpts::new(vertex_max).with_variant(variant).build()?;
            let params = EnumBenchParams {
                vertex_max,
                variant,
            };

            group.bench_with_input(BenchmarkId::from_parameter(params), &params, |b, run| {
                b.iter(|| {
                    let walker = EnumOpts::new(run.vertex_max)
                        .with_variant(run.variant)
                        .build();
                    walker.map(|ready| ready.run(|_graph| ControlFlow::Continue(())))
                });
            });
        }
    }

    group.finish();
    Ok(())
}

fn enumerate(c: &mut Criterion) {
    if let Err(err) = enumerate_impl(c) {
        panic!("enumerate benchmark setup failed: {err}");
    }
}

criterion_group!(benches, enumerate);
criterion_main!(benches);
