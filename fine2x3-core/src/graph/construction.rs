//! Growable slot-based graph instances.

use crate::{
    error::{GraphError, Result},
    traces::{
        Traces,
        engine::{self, CycleVectors},
    },
};

use super::{
    def::{EdgeDef, GraphDef},
    ops::{GrowOp, OpCode},
    partition::DisjointSet,
    vertex::{EdgeSlot, MAX_VERTEX_COUNT, SLOTS_PER_VERTEX, Sign, Vertex, VtxId},
};

/// A graph under construction: vertices, the ops that built them, and a
/// scratch trace buffer.
///
/// The vertex list is only ever changed through [`Construction::grow`], so
/// [`Construction::ops`] always replays to the current state.
///
/// # Examples
/// ```
/// use fine2x3_core::{Construction, GrowOp, OpCode};
///
/// let mut graph = Construction::new();
/// assert!(graph.grow(GrowOp::seed()));
/// assert!(graph.grow(GrowOp::new(OpCode::Sprout, 1, 1)));
/// assert!(graph.grow(GrowOp::new(OpCode::DuplicateEdge, 1, 1)));
/// assert_eq!(graph.traces(0).as_slice(), &[2, 10]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Construction {
    parent_id: u64,
    fork_id: u64,
    ops: Vec<GrowOp>,
    vtx: Vec<Vertex>,
    traces: Traces,
}

impl Construction {
    /// Creates an empty construction.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            parent_id: 0,
            fork_id: 0,
            ops: Vec::new(),
            vtx: Vec::new(),
            traces: Traces::new(),
        }
    }

    /// Creates an empty construction with room for `vertices` vertices.
    #[must_use]
    pub fn with_capacity(vertices: usize) -> Self {
        Self {
            vtx: Vec::with_capacity(vertices),
            ops: Vec::with_capacity(vertices * 2),
            ..Self::new()
        }
    }

    /// Resets `self` to a copy of `parent`, or to an empty graph.
    ///
    /// The copy inherits the parent's fork id and records it as its parent
    /// id. Existing allocations are reused.
    pub(crate) fn reset_from(&mut self, parent: Option<&Self>) {
        self.traces.set_len(0);
        match parent {
            Some(src) => {
                self.fork_id = src.fork_id;
                self.parent_id = src.fork_id;
                self.vtx.clone_from(&src.vtx);
                self.ops.clone_from(&src.ops);
            }
            None => {
                self.fork_id = 0;
                self.parent_id = 0;
                self.vtx.clear();
                self.ops.clear();
            }
        }
    }

    /// Rebuilds a construction by replaying `ops` from the empty graph.
    ///
    /// # Errors
    /// Returns [`GraphError::RejectedOp`] naming the first op that fails.
    pub fn replay(ops: &[GrowOp]) -> Result<Self> {
        let mut graph = Self::with_capacity(ops.len());
        for (step, &op) in ops.iter().enumerate() {
            if !graph.grow(op) {
                return Err(GraphError::RejectedOp { step, op });
            }
        }
        Ok(graph)
    }

    /// Builds a construction from a resolved vertex/edge list.
    ///
    /// Slots left unassigned stay natural loops. The resulting construction
    /// has an empty op history.
    ///
    /// # Errors
    /// Returns [`GraphError::EmptyGraph`] or [`GraphError::TooManyVertices`]
    /// for an unsupported vertex count, and part-indexed errors for edges
    /// naming unknown vertices or saturating a vertex's slots.
    pub fn from_def(def: &GraphDef) -> Result<Self> {
        def.check_vertex_count()?;
        let vertex_count = def.vertex_count();
        let mut graph = Self::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            graph.add_vertex();
        }
        let mut assigned = [0_usize; MAX_VERTEX_COUNT];

        for (part, edge) in def.edges().iter().enumerate() {
            for vertex in [edge.a, edge.b] {
                if vertex == 0 || usize::from(vertex) > vertex_count {
                    return Err(GraphError::VertexOutOfRange {
                        part,
                        vertex,
                        vertex_count,
                    });
                }
            }
            let pair = [edge.a, edge.b];
            let ends = if edge.is_loop() { &pair[..1] } else { &pair[..] };
            for &end in ends {
                if assigned[usize::from(end) - 1] == SLOTS_PER_VERTEX {
                    return Err(GraphError::SlotsExhausted { part, vertex: end });
                }
            }
            for &end in ends {
                let other = if edge.is_loop() {
                    0
                } else if end == edge.a {
                    edge.b
                } else {
                    edge.a
                };
                let idx = usize::from(end) - 1;
                let slot = &mut graph.vtx[idx].edges[assigned[idx]];
                slot.to = other;
                slot.sign = edge.sign;
                assigned[idx] += 1;
            }
        }
        Ok(graph)
    }

    /// Lists every slot as an edge: loops once per slot, joined pairs once
    /// from the lower-numbered endpoint.
    #[must_use]
    pub fn to_def(&self) -> GraphDef {
        let mut edges = Vec::with_capacity(self.vtx.len() * 2);
        for vertex in &self.vtx {
            for slot in &vertex.edges {
                if slot.is_open() {
                    edges.push(EdgeDef::new(vertex.id, vertex.id).with_sign(slot.sign));
                } else if slot.to > vertex.id {
                    edges.push(EdgeDef::new(vertex.id, slot.to).with_sign(slot.sign));
                }
            }
        }
        GraphDef::new(self.vtx.len(), edges)
    }

    /// Number of vertices.
    #[must_use]
    #[rustfmt::skip]
    pub fn vertex_count(&self) -> usize { self.vtx.len() }

    /// Borrows the vertex list.
    #[must_use]
    #[rustfmt::skip]
    pub fn vertices(&self) -> &[Vertex] { &self.vtx }

    /// Borrows the op history.
    #[must_use]
    #[rustfmt::skip]
    pub fn ops(&self) -> &[GrowOp] { &self.ops }

    /// Identifier assigned when this graph was accepted as a fork.
    #[must_use]
    #[rustfmt::skip]
    pub const fn fork_id(&self) -> u64 { self.fork_id }

    /// Fork id of the graph this one was copied from.
    #[must_use]
    #[rustfmt::skip]
    pub const fn parent_id(&self) -> u64 { self.parent_id }

    pub(crate) fn vertex_capacity(&self) -> usize {
        self.vtx.capacity()
    }

    pub(crate) fn set_fork_id(&mut self, fork_id: u64) {
        self.fork_id = fork_id;
    }

    /// Applies `op` and records it in the history when it succeeds.
    ///
    /// A failed op leaves the graph in an unspecified but structurally valid
    /// state; callers discard such graphs.
    pub fn grow(&mut self, op: GrowOp) -> bool {
        let applied = self.apply_op(op);
        if applied {
            self.ops.push(op);
        }
        applied
    }

    fn add_vertex(&mut self) -> VtxId {
        // Growth stops at `MAX_VERTEX_COUNT`, so the id always fits a byte.
        let id = (self.vtx.len() + 1) as VtxId;
        self.vtx.push(Vertex::new(id));
        id
    }

    fn slot_mut(&mut self, vertex: VtxId, slot: u8) -> &mut EdgeSlot {
        &mut self.vtx[usize::from(vertex) - 1].edges[usize::from(slot) - 1]
    }

    /// Locates the far end of the edge in `slot` on `vertex`.
    ///
    /// Parallel edges pair up by occurrence: the k-th slot on `vertex`
    /// joining the target matches the k-th slot on the target joining
    /// `vertex`. Returns the target, its paired slot, and its first open
    /// slot. Missing slots are reported as `0`.
    fn find_edge(&self, vertex: VtxId, slot: u8) -> Option<(VtxId, u8, u8)> {
        if vertex == 0 || usize::from(vertex) > self.vtx.len() {
            return None;
        }
        if slot == 0 || usize::from(slot) > SLOTS_PER_VERTEX {
            return None;
        }
        let near = &self.vtx[usize::from(vertex) - 1].edges;
        let target = near[usize::from(slot) - 1].to;
        if target == 0 {
            return None;
        }
        let occurrence = near[..usize::from(slot) - 1]
            .iter()
            .filter(|other| other.to == target)
            .count();
        let mut seen = 0;
        let mut edge_slot = 0;
        let mut free_slot = 0;
        for (idx, far) in (1_u8..).zip(&self.vtx[usize::from(target) - 1].edges) {
            if far.to == vertex {
                if seen == occurrence {
                    edge_slot = idx;
                }
                seen += 1;
            } else if far.is_open() && free_slot == 0 {
                free_slot = idx;
            }
        }
        Some((target, edge_slot, free_slot))
    }

    /// Copies the signs of `a`'s slots joining `b` onto `b`'s slots joining
    /// `a`, pairing them by occurrence.
    fn sync_parallel_signs(&mut self, a: VtxId, b: VtxId) {
        let mut signs = [Sign::Natural; SLOTS_PER_VERTEX];
        let mut count = 0;
        for slot in &self.vtx[usize::from(a) - 1].edges {
            if slot.to == b {
                signs[count] = slot.sign;
                count += 1;
            }
        }
        let mut next = 0;
        for slot in &mut self.vtx[usize::from(b) - 1].edges {
            if slot.to == a && next < count {
                slot.sign = signs[next];
                next += 1;
            }
        }
    }

    fn join(&mut self, a: VtxId, slot_a: u8, b: VtxId, slot_b: u8, sign: Sign) {
        *self.slot_mut(a, slot_a) = EdgeSlot { to: b, sign };
        *self.slot_mut(b, slot_b) = EdgeSlot { to: a, sign };
    }

    fn apply_op(&mut self, op: GrowOp) -> bool {
        if op.op_code == OpCode::Sprout && self.vtx.is_empty() {
            self.add_vertex();
            return true;
        }

        let adds_vertex = matches!(op.op_code, OpCode::Sprout | OpCode::SplitEdge);
        if adds_vertex && self.vtx.len() >= MAX_VERTEX_COUNT {
            return false;
        }

        let vtx_a = op.vtx;
        let slot_a = op.slot;
        if vtx_a == 0 || usize::from(vtx_a) > self.vtx.len() {
            return false;
        }
        if slot_a == 0 || usize::from(slot_a) > SLOTS_PER_VERTEX {
            return false;
        }

        match op.op_code {
            OpCode::Sprout => {
                if !self.vtx[usize::from(vtx_a) - 1].edges[usize::from(slot_a) - 1].is_open() {
                    return false;
                }
                let vtx_b = self.add_vertex();
                self.join(vtx_a, slot_a, vtx_b, 1, Sign::Natural);
                true
            }
            OpCode::DuplicateEdge => {
                let Some((vtx_b, _, open_b)) = self.find_edge(vtx_a, slot_a) else {
                    return false;
                };
                let Some(open_a) = self.vtx[usize::from(vtx_a) - 1].first_open_slot() else {
                    return false;
                };
                if open_b == 0 {
                    return false;
                }
                self.join(vtx_a, open_a, vtx_b, open_b, Sign::Natural);
                // The new slots may sit at different ordinals on each end.
                self.sync_parallel_signs(vtx_a, vtx_b);
                true
            }
            OpCode::SplitEdge => {
                let Some((vtx_b, slot_b, _)) = self.find_edge(vtx_a, slot_a) else {
                    return false;
                };
                if slot_b == 0 {
                    return false;
                }
                let sign = self.slot_mut(vtx_a, slot_a).sign;
                let vtx_c = self.add_vertex();
                // The near half keeps the edge's sign, so the path's product
                // matches the edge it replaces.
                self.join(vtx_a, slot_a, vtx_c, 1, sign);
                self.join(vtx_b, slot_b, vtx_c, 2, Sign::Natural);
                true
            }
            OpCode::NegateEdge => {
                let far = self.find_edge(vtx_a, slot_a);
                if matches!(far, Some((_, 0, _))) {
                    return false;
                }
                let slot = self.slot_mut(vtx_a, slot_a);
                slot.sign = if slot.sign == Sign::Invert {
                    Sign::Natural
                } else {
                    Sign::Invert
                };
                // An open slot is a loop with no far end to update.
                if let Some((vtx_b, _, _)) = far {
                    self.sync_parallel_signs(vtx_a, vtx_b);
                }
                true
            }
        }
    }

    /// Computes the first `count` traces, or `vertex_count()` of them when
    /// `count` is zero.
    ///
    /// The result is stored in an internal buffer that is reused (and grown
    /// in multiples of four) across calls.
    pub fn traces(&mut self, count: usize) -> &Traces {
        let len = if count == 0 { self.vtx.len() } else { count };
        self.traces.reserve_rounded(len);
        self.traces.set_len(len);
        engine::propagate(&self.vtx, self.traces.as_mut_slice(), None);
        &self.traces
    }

    /// Records every vertex's cycle vector over walk lengths
    /// `1..=vertex_count()`.
    #[must_use]
    pub fn cycle_vectors(&self) -> CycleVectors {
        let mut cycles = CycleVectors::new();
        let mut scratch = vec![0_i64; self.vtx.len()];
        engine::propagate(&self.vtx, &mut scratch, Some(&mut cycles));
        cycles
    }

    /// Number of connected components.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        let mut parts = DisjointSet::new(self.vtx.len());
        for vertex in &self.vtx {
            for (_, slot) in vertex.forward_edges() {
                parts.union(usize::from(vertex.id) - 1, usize::from(slot.to) - 1);
            }
        }
        parts.components()
    }

    /// Renders the op history as space-separated op glyphs.
    #[must_use]
    pub fn ops_string(&self) -> String {
        let mut out = String::with_capacity(self.ops.len() * 5);
        for (idx, op) in self.ops.iter().enumerate() {
            if idx > 0 {
                out.push(' ');
            }
            out.push_str(&op.to_string());
        }
        out
    }

    /// Checks that every joined slot has a reciprocal slot on its target
    /// carrying the same sign.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`] for a slot targeting a
    /// missing vertex (with the vertex's index as the part),
    /// [`GraphError::BrokenEdge`] when the two ends disagree on how many
    /// slots join them, and [`GraphError::SignMismatch`] when paired slots
    /// carry different signs.
    pub fn validate(&self) -> Result<()> {
        for (part, vertex) in self.vtx.iter().enumerate() {
            for (slot_idx, slot) in (1_u8..).zip(&vertex.edges) {
                if slot.is_open() {
                    continue;
                }
                let Some(target) = self.vtx.get(usize::from(slot.to).wrapping_sub(1)) else {
                    return Err(GraphError::VertexOutOfRange {
                        part,
                        vertex: slot.to,
                        vertex_count: self.vtx.len(),
                    });
                };
                if slot.to == vertex.id
                    || joining(target, vertex.id).count() != joining(vertex, slot.to).count()
                {
                    return Err(GraphError::BrokenEdge {
                        vertex: vertex.id,
                        slot: slot_idx,
                        target: slot.to,
                    });
                }
                if !joining(target, vertex.id).eq(joining(vertex, slot.to)) {
                    return Err(GraphError::SignMismatch {
                        vertex: vertex.id,
                        slot: slot_idx,
                        target: slot.to,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Signs of `vertex`'s slots joining `target`, in slot order.
fn joining(vertex: &Vertex, target: VtxId) -> impl Iterator<Item = Sign> + '_ {
    vertex
        .edges
        .iter()
        .filter(move |slot| slot.to == target)
        .map(|slot| slot.sign)
}
