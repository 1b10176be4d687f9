//! Filtering a graph stream by size and traces.

use std::ops::DerefMut;

use crate::{graph::Construction, traces::Traces};

/// Chooses which graphs of a stream to keep.
///
/// A graph passes when its vertex count lies in the configured range and,
/// if traces were given, its leading traces equal them.
///
/// # Examples
/// ```
/// use fine2x3_core::{Construction, GraphDef, StreamSelector};
///
/// let mut edge = Construction::from_def(&GraphDef::natural(2, &[(1, 2)]))?;
/// let wanted = edge.traces(2).to_vec();
/// let mut graphs = vec![
///     Construction::from_def(&GraphDef::natural(1, &[]))?,
///     edge,
///     Construction::from_def(&GraphDef::natural(2, &[(1, 2), (1, 2)]))?,
/// ];
/// let kept = StreamSelector::vertices(2, 2)
///     .with_traces(wanted)
///     .select(graphs.iter_mut())
///     .count();
/// assert_eq!(kept, 1);
/// # Ok::<(), fine2x3_core::GraphError>(())
/// ```
#[derive(Clone, Debug)]
pub struct StreamSelector {
    min_vertices: usize,
    max_vertices: usize,
    traces: Traces,
}

impl StreamSelector {
    /// Keeps graphs with `min..=max` vertices.
    #[must_use]
    pub const fn vertices(min: usize, max: usize) -> Self {
        Self {
            min_vertices: min,
            max_vertices: max,
            traces: Traces::new(),
        }
    }

    /// Also requires the leading traces to equal `traces`; an empty vector
    /// matches everything.
    #[must_use]
    pub fn with_traces(mut self, traces: impl Into<Traces>) -> Self {
        self.traces = traces.into();
        self
    }

    /// Returns `true` when `graph` passes the selector.
    pub fn allows(&self, graph: &mut Construction) -> bool {
        let nv = graph.vertex_count();
        if nv < self.min_vertices || nv > self.max_vertices {
            return false;
        }
        self.traces.is_empty() || graph.traces(self.traces.len()).is_equal(&self.traces)
    }

    /// Filters `graphs`, yielding those that pass.
    pub fn select<I, G>(self, graphs: I) -> impl Iterator<Item = G>
    where
        I: IntoIterator<Item = G>,
        G: DerefMut<Target = Construction>,
    {
        graphs
            .into_iter()
            .filter_map(move |mut graph| self.allows(&mut graph).then_some(graph))
    }
}
