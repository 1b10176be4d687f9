//! Benchmark parameter types, rendered as Criterion parameter labels.

use std::fmt;

use fine2x3_core::WalkerVariant;

/// Parameters for a trace computation run.
#[derive(Clone, Copy, Debug)]
pub struct TracesBenchParams {
    /// Vertices per graph.
    pub vertex_count: usize,
    /// Traces computed per graph.
    pub trace_count: usize,
}

impl fmt::Display for TracesBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nv={},k={}", self.vertex_count, self.trace_count)
    }
}

/// Parameters for an enumeration run.
#[derive(Clone, Copy, Debug)]
pub struct EnumBenchParams {
    /// Vertex cap.
    pub vertex_max: usize,
    /// Fork generators in use.
    pub variant: WalkerVariant,
}

impl fmt::Display for EnumBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self.variant {
            WalkerVariant::Minimal => "minimal",
            WalkerVariant::WithSplits => "splits",
        };
        write!(f, "cap={},{variant}", self.vertex_max)
    }
}

/// Parameters for a factorization run.
#[derive(Clone, Copy, Debug)]
pub struct FactorBenchParams {
    /// Vertex count of the factored targets.
    pub vertex_count: usize,
}

impl fmt::Display for FactorBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nv={}", self.vertex_count)
    }
}
