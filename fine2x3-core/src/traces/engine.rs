//! Signed-walk propagation over a vertex slot table.
//!
//! Row `vi` of the state matrix holds, for every vertex `j`, the signed count
//! of walks that left `vi` and currently sit at `j`. Each step pulls flow
//! across every slot of `j` from the slot's source vertex, so after `i + 1`
//! steps the diagonal entry `(vi, vi)` counts closed walks of length `i + 1`
//! through `vi`.

use crate::graph::Vertex;

/// Per-vertex diagonal "return flow" values recorded during propagation.
///
/// Row `v` holds one value per walk length for the vertex at index `v`; the
/// rows sum column-wise to the aggregate trace vector.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CycleVectors {
    len: usize,
    values: Vec<i64>,
}

impl CycleVectors {
    /// Creates an empty recorder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            len: 0,
            values: Vec::new(),
        }
    }

    fn reset(&mut self, vertex_count: usize, len: usize) {
        self.len = len;
        self.values.clear();
        self.values.resize(vertex_count * len, 0);
    }

    /// Number of walk lengths recorded per vertex.
    #[must_use]
    #[rustfmt::skip]
    pub const fn len(&self) -> usize { self.len }

    /// Returns `true` when nothing has been recorded.
    #[must_use]
    #[rustfmt::skip]
    pub const fn is_empty(&self) -> bool { self.len == 0 }

    /// Number of vertices recorded.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        if self.len == 0 {
            0
        } else {
            self.values.len() / self.len
        }
    }

    /// Borrows the cycle vector of the vertex at zero-based `idx`.
    ///
    /// # Panics
    /// Panics when `idx` is not below [`CycleVectors::vertex_count`].
    #[must_use]
    pub fn vertex(&self, idx: usize) -> &[i64] {
        &self.values[idx * self.len..(idx + 1) * self.len]
    }

    /// Iterates the cycle vectors in vertex order.
    pub fn iter(&self) -> impl Iterator<Item = &[i64]> + '_ {
        self.values.chunks_exact(self.len.max(1))
    }
}

/// Fills `out` with the trace values of `vertices`, one per walk length.
///
/// When `cycles` is provided it is reset and receives every vertex's return
/// flow for each step.
pub fn propagate(vertices: &[Vertex], out: &mut [i64], mut cycles: Option<&mut CycleVectors>) {
    let nv = vertices.len();
    let steps = out.len();
    if let Some(recorder) = cycles.as_deref_mut() {
        recorder.reset(nv, steps);
    }
    if nv == 0 {
        out.fill(0);
        return;
    }

    let cells = nv * nv;
    let mut scratch = vec![0_i64; cells * 2];
    let (mut prev, mut next) = scratch.split_at_mut(cells);
    for (vi, row) in prev.chunks_exact_mut(nv).enumerate() {
        row[vi] = 1;
    }

    for (ti, trace) in out.iter_mut().enumerate() {
        let mut total = 0_i64;
        for (vi, (prev_row, next_row)) in prev
            .chunks_exact(nv)
            .zip(next.chunks_exact_mut(nv))
            .enumerate()
        {
            for (cell, vertex) in next_row.iter_mut().zip(vertices) {
                *cell = vertex
                    .edges
                    .iter()
                    .map(|slot| {
                        let src = usize::from(vertex.source_of(slot)) - 1;
                        slot.sign.weight() * prev_row[src]
                    })
                    .sum();
            }
            let returned = next_row[vi];
            total += returned;
            if let Some(recorder) = cycles.as_deref_mut() {
                recorder.values[vi * steps + ti] = returned;
            }
        }
        *trace = total;
        std::mem::swap(&mut prev, &mut next);
    }
}
