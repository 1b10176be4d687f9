//! Enumerating the edge-sign assignments of a graph.
//!
//! Parallel edges between one vertex pair, and the loops on one vertex, are
//! interchangeable, so each such group contributes "how many are inverted"
//! rather than one choice per slot. A group of `k` slots therefore offers
//! `k + 1` assignments. Signs are written with
//! [`OpCode::NegateEdge`] so every emitted graph records how it was reached.

use std::ops::Deref;

use crate::graph::{Construction, GrowOp, OpCode, SLOTS_PER_VERTEX, Sign, VtxId};

/// Slots of one vertex whose signs vary together.
#[derive(Clone, Debug)]
struct SignGroup {
    vertex: VtxId,
    slots: [u8; SLOTS_PER_VERTEX],
    len: usize,
}

impl SignGroup {
    fn new(vertex: VtxId) -> Self {
        Self {
            vertex,
            slots: [0; SLOTS_PER_VERTEX],
            len: 0,
        }
    }

    fn push(&mut self, slot: u8) {
        self.slots[self.len] = slot;
        self.len += 1;
    }

    /// Inverts the first `inverted` slots and restores the rest.
    fn apply(&self, graph: &mut Construction, inverted: usize) {
        for (idx, &slot) in self.slots[..self.len].iter().enumerate() {
            let want = if idx < inverted {
                Sign::Invert
            } else {
                Sign::Natural
            };
            let current = graph.vertices()[usize::from(self.vertex) - 1].edges
                [usize::from(slot) - 1]
                .sign;
            if current != want {
                graph.grow(GrowOp::new(OpCode::NegateEdge, self.vertex, slot));
            }
        }
    }
}

fn sign_groups(graph: &Construction) -> Vec<SignGroup> {
    let mut groups = Vec::new();
    for vertex in graph.vertices() {
        let mut loops = SignGroup::new(vertex.id);
        let mut pairs: Vec<(VtxId, SignGroup)> = Vec::new();
        for (slot, edge) in (1_u8..).zip(&vertex.edges) {
            if edge.sign == Sign::Zero {
                continue;
            }
            if edge.is_open() {
                loops.push(slot);
            } else if edge.to > vertex.id {
                match pairs.iter_mut().find(|(to, _)| *to == edge.to) {
                    Some((_, group)) => group.push(slot),
                    None => {
                        let mut group = SignGroup::new(vertex.id);
                        group.push(slot);
                        pairs.push((edge.to, group));
                    }
                }
            }
        }
        if loops.len > 0 {
            groups.push(loops);
        }
        groups.extend(pairs.into_iter().map(|(_, group)| group));
    }
    groups
}

/// Every edge-sign assignment of one graph, in mixed-radix order.
///
/// The first graph has every edge and loop natural; the last has every one
/// inverted. Slots with [`Sign::Zero`] are left alone.
///
/// # Examples
/// ```
/// use fine2x3_core::{Construction, GraphDef, all_edge_signs};
///
/// let edge = Construction::from_def(&GraphDef::natural(2, &[(1, 2)]))?;
/// let signs = all_edge_signs(&edge);
/// // Two loops on each vertex and the edge itself.
/// assert_eq!(signs.permutation_count(), 3 * 3 * 2);
/// assert_eq!(signs.count(), 18);
/// # Ok::<(), fine2x3_core::GraphError>(())
/// ```
#[derive(Clone, Debug)]
pub struct EdgeSignPermutations {
    base: Construction,
    groups: Vec<SignGroup>,
    digits: Vec<usize>,
    exhausted: bool,
}

impl EdgeSignPermutations {
    /// Number of assignments the iterator yields in total.
    #[must_use]
    pub fn permutation_count(&self) -> u64 {
        self.groups
            .iter()
            .map(|group| group.len as u64 + 1)
            .product()
    }

    /// Moves to the next assignment; returns `false` once every digit
    /// wraps around.
    fn advance(&mut self) -> bool {
        for (digit, group) in self.digits.iter_mut().zip(&self.groups) {
            if *digit < group.len {
                *digit += 1;
                return true;
            }
            *digit = 0;
        }
        false
    }
}

impl Iterator for EdgeSignPermutations {
    type Item = Construction;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let mut graph = self.base.clone();
        for (group, &inverted) in self.groups.iter().zip(&self.digits) {
            group.apply(&mut graph, inverted);
        }
        self.exhausted = !self.advance();
        Some(graph)
    }
}

/// Lists every edge-sign assignment of `graph`.
#[must_use]
pub fn all_edge_signs(graph: &Construction) -> EdgeSignPermutations {
    let groups = sign_groups(graph);
    EdgeSignPermutations {
        base: graph.clone(),
        digits: vec![0; groups.len()],
        groups,
        exhausted: false,
    }
}

/// Replaces each graph in `graphs` with all of its edge-sign assignments.
///
/// Gauge-equivalent assignments are all emitted; chain
/// [`super::DropDuplicates::filter`] to keep one of each.
pub fn permute_edge_signs<I, G>(graphs: I) -> impl Iterator<Item = Construction>
where
    I: IntoIterator<Item = G>,
    G: Deref<Target = Construction>,
{
    graphs
        .into_iter()
        .flat_map(|graph| all_edge_signs(&graph))
}
