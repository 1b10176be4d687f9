//! Grow operations recorded in a construction's build history.

use std::fmt;

use super::vertex::{SLOTS_PER_VERTEX, VtxId};

/// Structural operation applied to a construction.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum OpCode {
    /// Add a vertex joined to an open slot (or the first vertex of an empty graph).
    Sprout,
    /// Add a second parallel edge alongside an existing one.
    DuplicateEdge,
    /// Insert a new vertex in the middle of an existing edge.
    SplitEdge,
    /// Flip the sign of an edge.
    NegateEdge,
}

impl OpCode {
    /// Two-character glyph used when rendering an op history.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::NegateEdge => "~ ",
            Self::DuplicateEdge => "||",
            Self::SplitEdge => "><",
            Self::Sprout => "->",
        }
    }
}

/// A graph-building step: an [`OpCode`] aimed at a vertex slot.
///
/// # Examples
/// ```
/// use fine2x3_core::{GrowOp, OpCode};
///
/// let op = GrowOp::new(OpCode::Sprout, 1, 1);
/// assert_eq!(op.to_string(), "04->");
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct GrowOp {
    /// Operation to perform.
    pub op_code: OpCode,
    /// One-based target vertex, or `0` for the initial sprout.
    pub vtx: VtxId,
    /// One-based target slot on `vtx`.
    pub slot: u8,
}

impl GrowOp {
    /// Creates an op targeting `slot` on `vtx`.
    #[must_use]
    pub const fn new(op_code: OpCode, vtx: VtxId, slot: u8) -> Self {
        Self { op_code, vtx, slot }
    }

    /// The op that seeds an empty construction with its first vertex.
    #[must_use]
    pub const fn seed() -> Self {
        Self::new(OpCode::Sprout, 0, 0)
    }

    /// Flattened slot ordinal, `vtx * 3 + slot`.
    #[must_use]
    pub const fn slot_ordinal(&self) -> usize {
        self.vtx as usize * SLOTS_PER_VERTEX + self.slot as usize
    }
}

impl fmt::Display for GrowOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{}", self.slot_ordinal(), self.op_code.glyph())
    }
}
