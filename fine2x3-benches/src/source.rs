//! Seeded random graphs for benchmarks.

use fine2x3_core::{Construction, GrowOp, OpCode};
use rand::{Rng, SeedableRng, rngs::SmallRng, seq::SliceRandom};

use crate::error::BenchSetupError;

const GROW_OPS: [OpCode; 4] = [
    OpCode::Sprout,
    OpCode::DuplicateEdge,
    OpCode::SplitEdge,
    OpCode::NegateEdge,
];

/// Attempts allowed per graph before growth is declared stalled.
const ATTEMPTS_PER_VERTEX: usize = 256;

/// Configuration for [`random_graphs`].
#[derive(Clone, Copy, Debug)]
pub struct RandomGraphConfig {
    /// Vertices per graph.
    pub vertex_count: usize,
    /// Number of graphs to grow.
    pub graph_count: usize,
    /// Seed for the generator.
    pub seed: u64,
}

/// Grows `graph_count` connected graphs of exactly `vertex_count` vertices
/// by applying random grow ops from a single seed vertex.
///
/// # Errors
/// Returns [`BenchSetupError::GrowthStalled`] when a graph cannot reach the
/// requested size, which happens when every slot fills up early.
///
/// # Examples
/// ```
/// use fine2x3_benches::source::{RandomGraphConfig, random_graphs};
///
/// let graphs = random_graphs(&RandomGraphConfig {
///     vertex_count: 6,
///     graph_count: 3,
///     seed: 7,
/// })?;
/// assert_eq!(graphs.len(), 3);
/// assert!(graphs.iter().all(|graph| graph.vertex_count() == 6));
/// # Ok::<(), fine2x3_benches::error::BenchSetupError>(())
/// ```
pub fn random_graphs(config: &RandomGraphConfig) -> Result<Vec<Construction>, BenchSetupError> {
    let mut rng = SmallRng::seed_from_u64(config.seed);
    (0..config.graph_count)
        .map(|_| grow_one(&mut rng, config.vertex_count))
        .collect()
}

fn grow_one(rng: &mut SmallRng, target: usize) -> Result<Construction, BenchSetupError> {
    let mut graph = Construction::new();
    graph.grow(GrowOp::seed());
    for _ in 0..target.saturating_mul(ATTEMPTS_PER_VERTEX) {
        if graph.vertex_count() >= target {
            break;
        }
        let Some(&op_code) = GROW_OPS.choose(rng) else {
            break;
        };
        let Ok(vtx) = u8::try_from(rng.gen_range(1..=graph.vertex_count())) else {
            break;
        };
        let op = GrowOp::new(op_code, vtx, rng.gen_range(1..=3));
        // A rejected op may leave partial edits behind.
        let mut next = graph.clone();
        if next.grow(op) {
            graph = next;
        }
    }
    if graph.vertex_count() == target {
        Ok(graph)
    } else {
        Err(BenchSetupError::GrowthStalled { target })
    }
}
