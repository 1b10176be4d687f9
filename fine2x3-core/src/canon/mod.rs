//! Canonicalisation by cycle-vector refinement.
//!
//! Vertices are partitioned into cycle groups by their cycle vectors, edges
//! are re-described relative to those groups, and identical vertices are
//! run-length compressed. The result is invariant under vertex relabelling
//! but is not a full isomorphism certificate.

mod form;

use tracing::instrument;

pub use form::{CanonicalForm, CanonicalGroup, EdgeFamily};

use crate::{
    graph::{Construction, SLOTS_PER_VERTEX, Sign},
    traces::codec,
};

/// Computes the canonical form of `graph`.
///
/// # Panics
/// Panics if the recorded cycle vectors do not cover every vertex, which
/// would indicate a defect in the trace engine.
#[must_use]
#[instrument(
    name = "canon.canonicalise",
    level = "trace",
    skip(graph),
    fields(vertex_count = graph.vertex_count())
)]
pub fn canonicalise(graph: &Construction) -> CanonicalForm {
    let vertices = graph.vertices();
    let cycles = graph.cycle_vectors();
    assert_eq!(
        cycles.vertex_count(),
        vertices.len(),
        "cycle vectors must cover every vertex"
    );

    let mut order: Vec<usize> = (0..vertices.len()).collect();
    order.sort_by(|&a, &b| cycles.vertex(a).cmp(cycles.vertex(b)));

    let mut group_of = vec![0_u8; vertices.len()];
    let mut next_group = 0_u8;
    for (rank, &idx) in order.iter().enumerate() {
        let is_new = rank == 0 || cycles.vertex(order[rank - 1]) != cycles.vertex(idx);
        if is_new {
            next_group += 1;
        }
        group_of[idx] = next_group;
    }

    let groups = vertices
        .iter()
        .enumerate()
        .map(|(idx, vertex)| {
            let home = group_of[idx];
            let mut edges = [(EdgeFamily::LoopVtx, Sign::Natural); SLOTS_PER_VERTEX];
            for (edge, slot) in edges.iter_mut().zip(&vertex.edges) {
                let family = if slot.is_open() {
                    EdgeFamily::LoopVtx
                } else {
                    let target = group_of[usize::from(slot.to) - 1];
                    if target == home {
                        EdgeFamily::LoopGroup
                    } else {
                        EdgeFamily::Group(target)
                    }
                };
                *edge = (family, slot.sign);
            }
            CanonicalGroup {
                cycle_group: home,
                edges,
                count: 1,
            }
        })
        .collect();
    CanonicalForm::from_groups(groups)
}

/// Builds the full catalog key of `graph`: its traces key followed by its
/// canonical encoding.
///
/// Two graphs share a key exactly when their traces and canonical forms
/// agree, which is the identity used to drop duplicates.
#[must_use]
pub fn graph_key(graph: &mut Construction) -> Vec<u8> {
    let mut key = codec::encode_key(graph.traces(0));
    canonicalise(graph).append_to(&mut key);
    key
}

#[cfg(test)]
mod tests;
