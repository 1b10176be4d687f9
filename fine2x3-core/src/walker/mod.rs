//! Level-synchronised enumeration of 2x3 graphs.
//!
//! The walker grows graphs breadth first from a single vertex. Every dequeued
//! graph is forked by duplicating, splitting, and sprouting edges; a fork
//! survives only when its trace signature has not been seen during the run.
//! All graphs of `n` vertices are expanded and emitted before any graph of
//! `n + 1` vertices is dequeued.

mod cancel;
mod dedupe;
mod select;
mod signs;
mod stream;

use std::{ops::ControlFlow, sync::Arc};

use dashmap::DashSet;
use tracing::{info, instrument};

pub use cancel::CancelToken;
pub use dedupe::DropDuplicates;
pub use select::StreamSelector;
pub use signs::{EdgeSignPermutations, all_edge_signs, permute_edge_signs};
pub use stream::EnumStream;

use crate::{
    error::EnumError,
    graph::{Construction, ConstructionPool, GraphQueue, GrowOp, MAX_VERTEX_COUNT, OpCode, Pooled},
    traces::codec,
};

/// Selects which fork generators the walker runs.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum WalkerVariant {
    /// Duplicate and sprout only.
    Minimal,
    /// Duplicate, split, and sprout.
    #[default]
    WithSplits,
}

/// Configures an enumeration run.
///
/// # Examples
/// ```
/// use fine2x3_core::{EnumOpts, WalkerVariant};
///
/// let walker = EnumOpts::new(3)
///     .with_variant(WalkerVariant::Minimal)
///     .build()
///     .expect("options are valid");
/// let mut count = 0;
/// let summary = walker.run(|_graph| {
///     count += 1;
///     std::ops::ControlFlow::Continue(())
/// });
/// assert_eq!(summary.emitted(), count);
/// assert!(summary.completed());
/// ```
#[derive(Clone, Debug)]
pub struct EnumOpts {
    vertex_max: usize,
    variant: WalkerVariant,
    pool: Option<Arc<ConstructionPool>>,
    cancel: Option<CancelToken>,
    channel_capacity: usize,
}

impl EnumOpts {
    /// Default number of graphs buffered between the walker and its consumer.
    pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

    /// Starts a configuration enumerating graphs of up to `vertex_max`
    /// vertices.
    #[must_use]
    pub fn new(vertex_max: usize) -> Self {
        Self {
            vertex_max,
            variant: WalkerVariant::default(),
            pool: None,
            cancel: None,
            channel_capacity: Self::DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Chooses the fork generators.
    #[must_use]
    pub fn with_variant(mut self, variant: WalkerVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Draws constructions from `pool` instead of the process-wide pool.
    #[must_use]
    pub fn with_pool(mut self, pool: Arc<ConstructionPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Stops the run once `token` is cancelled.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Sets how many graphs a spawned walker may buffer ahead of its
    /// consumer; zero hands each graph over directly.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    #[must_use]
    #[rustfmt::skip]
    pub fn vertex_max(&self) -> usize { self.vertex_max }

    #[must_use]
    #[rustfmt::skip]
    pub fn variant(&self) -> WalkerVariant { self.variant }

    #[must_use]
    #[rustfmt::skip]
    pub fn channel_capacity(&self) -> usize { self.channel_capacity }

    /// Validates the configuration and prepares a walker.
    ///
    /// # Errors
    /// Returns [`EnumError::InvalidVertexMax`] unless
    /// `1 <= vertex_max <= MAX_VERTEX_COUNT`.
    pub fn build(self) -> Result<GraphWalker, EnumError> {
        if !(1..=MAX_VERTEX_COUNT).contains(&self.vertex_max) {
            return Err(EnumError::InvalidVertexMax {
                got: self.vertex_max,
                max: MAX_VERTEX_COUNT,
            });
        }
        Ok(GraphWalker {
            vertex_max: self.vertex_max,
            variant: self.variant,
            pool: self.pool.unwrap_or_else(ConstructionPool::shared),
            cancel: self.cancel.unwrap_or_default(),
            channel_capacity: self.channel_capacity,
            fork_count: 0,
            rejected: 0,
            emitted: DashSet::new(),
            walking_vertex: 1,
            walking: GraphQueue::new(),
            deferred: GraphQueue::new(),
        })
    }
}

/// Counts reported when a walk ends.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WalkSummary {
    emitted: u64,
    forks_accepted: u64,
    forks_rejected: u64,
    completed: bool,
}

impl WalkSummary {
    /// Graphs handed to the consumer.
    #[must_use]
    #[rustfmt::skip]
    pub const fn emitted(&self) -> u64 { self.emitted }

    /// Forks that passed the uniqueness filter, including the seed graph.
    #[must_use]
    #[rustfmt::skip]
    pub const fn forks_accepted(&self) -> u64 { self.forks_accepted }

    /// Forks discarded as invalid, oversized, or already seen.
    #[must_use]
    #[rustfmt::skip]
    pub const fn forks_rejected(&self) -> u64 { self.forks_rejected }

    /// `false` when the run was cancelled or its consumer stopped early.
    #[must_use]
    #[rustfmt::skip]
    pub const fn completed(&self) -> bool { self.completed }
}

/// A configured enumeration run; see [`EnumOpts`].
#[derive(Debug)]
pub struct GraphWalker {
    vertex_max: usize,
    variant: WalkerVariant,
    pool: Arc<ConstructionPool>,
    cancel: CancelToken,
    channel_capacity: usize,
    fork_count: u64,
    rejected: u64,
    emitted: DashSet<Vec<u8>>,
    walking_vertex: usize,
    walking: GraphQueue,
    deferred: GraphQueue,
}

impl GraphWalker {
    /// Runs the walk on the current thread, handing every graph to `sink`.
    ///
    /// The walk ends when both queues drain, the cancel token fires, or
    /// `sink` returns [`ControlFlow::Break`].
    #[instrument(
        name = "walker.run",
        skip(self, sink),
        fields(vertex_max = self.vertex_max, variant = ?self.variant),
    )]
    pub fn run<F>(mut self, mut sink: F) -> WalkSummary
    where
        F: FnMut(Pooled) -> ControlFlow<()>,
    {
        let mut emitted = 0_u64;
        let mut completed = true;
        self.try_emit_fork(None, GrowOp::seed());

        while let Some(graph) = self.dequeue_next() {
            if self.cancel.is_cancelled() {
                completed = false;
                break;
            }
            self.duplicate_edges(&graph);
            if self.variant == WalkerVariant::WithSplits {
                self.split_edges(&graph);
            }
            self.sprout_edges(&graph);

            emitted += 1;
            if sink(graph).is_break() {
                completed = false;
                break;
            }
        }

        let summary = WalkSummary {
            emitted,
            forks_accepted: self.fork_count,
            forks_rejected: self.rejected,
            completed,
        };
        info!(
            emitted = summary.emitted,
            forks_accepted = summary.forks_accepted,
            forks_rejected = summary.forks_rejected,
            completed = summary.completed,
            "enumeration finished"
        );
        summary
    }

    /// Moves the walk onto a worker thread and returns the stream of graphs.
    ///
    /// # Errors
    /// Returns [`EnumError::Spawn`] when the worker thread cannot start.
    pub fn spawn(self) -> Result<EnumStream, EnumError> {
        EnumStream::spawn(self)
    }

    fn dequeue_next(&mut self) -> Option<Pooled> {
        if self.walking.is_empty() && !self.deferred.is_empty() {
            self.walking_vertex += 1;
            std::mem::swap(&mut self.walking, &mut self.deferred);
        }
        self.walking.dequeue()
    }

    fn is_unique(&self, graph: &mut Construction) -> bool {
        self.emitted.insert(codec::encode_key(graph.traces(0)))
    }

    fn try_emit_fork(&mut self, parent: Option<&Construction>, op: GrowOp) {
        let mut child = self.pool.acquire(parent);
        let applied = child.grow(op);
        let vertex_count = child.vertex_count();
        if !applied || vertex_count > self.vertex_max || !self.is_unique(&mut child) {
            self.rejected += 1;
            record_fork_rejected();
            return;
        }
        self.fork_count += 1;
        child.set_fork_id(self.fork_count);
        record_fork_accepted();

        if vertex_count <= self.walking_vertex {
            self.walking.enqueue(child);
        } else {
            self.deferred.enqueue(child);
        }
    }

    fn duplicate_edges(&mut self, graph: &Construction) {
        for vertex in graph.vertices() {
            if vertex.first_open_slot().is_none() {
                continue;
            }
            if let Some((slot, _)) = vertex.forward_edges().next() {
                let op = GrowOp::new(OpCode::DuplicateEdge, vertex.id, slot);
                self.try_emit_fork(Some(graph), op);
            }
        }
    }

    fn split_edges(&mut self, graph: &Construction) {
        if graph.vertex_count() >= self.vertex_max {
            return;
        }
        for vertex in graph.vertices() {
            for (slot, _) in vertex.forward_edges() {
                let op = GrowOp::new(OpCode::SplitEdge, vertex.id, slot);
                self.try_emit_fork(Some(graph), op);
            }
        }
    }

    fn sprout_edges(&mut self, graph: &Construction) {
        if graph.vertex_count() >= self.vertex_max {
            return;
        }
        for vertex in graph.vertices() {
            if let Some(slot) = vertex.first_open_slot() {
                let op = GrowOp::new(OpCode::Sprout, vertex.id, slot);
                self.try_emit_fork(Some(graph), op);
            }
        }
    }
}

#[cfg(feature = "metrics")]
fn record_fork_accepted() {
    metrics::counter!("walker_forks_accepted").increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_fork_accepted() {}

#[cfg(feature = "metrics")]
fn record_fork_rejected() {
    metrics::counter!("walker_forks_rejected").increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_fork_rejected() {}

/// Validates `opts` and starts a streaming enumeration.
///
/// # Errors
/// Returns [`EnumError`] for an invalid configuration or when the worker
/// thread cannot be spawned.
///
/// # Examples
/// ```
/// use fine2x3_core::{EnumOpts, enumerate};
///
/// let counts: Vec<usize> = enumerate(EnumOpts::new(2))?
///     .map(|graph| graph.vertex_count())
///     .collect();
/// assert_eq!(counts, [1, 2, 2, 2]);
/// # Ok::<(), fine2x3_core::EnumError>(())
/// ```
pub fn enumerate(opts: EnumOpts) -> Result<EnumStream, EnumError> {
    opts.build()?.spawn()
}

#[cfg(test)]
mod tests;
