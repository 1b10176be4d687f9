//! Dropping graphs already seen in a stream.

use dashmap::DashSet;

use crate::{canon::graph_key, graph::Construction};

/// Remembers graphs by traces key plus canonical encoding.
///
/// The set is concurrent, so one filter can be shared by several workers.
///
/// # Examples
/// ```
/// use fine2x3_core::{Construction, DropDuplicates, GraphDef};
///
/// let dedupe = DropDuplicates::new();
/// let mut a = Construction::from_def(&GraphDef::natural(3, &[(1, 2), (2, 3)]))?;
/// let mut b = Construction::from_def(&GraphDef::natural(3, &[(3, 1), (1, 2)]))?;
/// assert!(dedupe.insert(&mut a));
/// assert!(!dedupe.insert(&mut b));
/// # Ok::<(), fine2x3_core::GraphError>(())
/// ```
#[derive(Debug, Default)]
pub struct DropDuplicates {
    seen: DashSet<Vec<u8>>,
}

impl DropDuplicates {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `graph`, returning `true` the first time its key is seen.
    pub fn insert(&self, graph: &mut Construction) -> bool {
        self.seen.insert(graph_key(graph))
    }

    /// Number of distinct graphs recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns `true` when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Filters `graphs`, yielding only first occurrences.
    pub fn filter<I, G>(self, graphs: I) -> impl Iterator<Item = G>
    where
        I: IntoIterator<Item = G>,
        G: std::ops::DerefMut<Target = Construction>,
    {
        graphs
            .into_iter()
            .filter_map(move |mut graph| self.insert(&mut graph).then_some(graph))
    }
}
