//! Fixed-arity vertex and edge-slot records.

/// One-based vertex identifier; `0` marks an inward (self-loop) slot target.
pub type VtxId = u8;

/// Number of edge slots carried by every vertex.
pub const SLOTS_PER_VERTEX: usize = 3;

/// Largest vertex count supported by the graph model.
pub const MAX_VERTEX_COUNT: usize = 31;

/// Sign or weight carried by an edge slot.
///
/// `Natural` and `Invert` scale walk contributions by `+1` and `-1`; `Zero`
/// marks an empty slot that contributes nothing.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Sign {
    /// Walks through this slot count positively.
    #[default]
    Natural,
    /// Walks through this slot count negatively.
    Invert,
    /// The slot is empty.
    Zero,
}

impl Sign {
    /// Returns the integer weight applied to walks through the slot.
    ///
    /// # Examples
    /// ```
    /// use fine2x3_core::Sign;
    ///
    /// assert_eq!(Sign::Natural.weight(), 1);
    /// assert_eq!(Sign::Invert.weight(), -1);
    /// assert_eq!(Sign::Zero.weight(), 0);
    /// ```
    #[must_use]
    pub const fn weight(self) -> i64 {
        match self {
            Self::Natural => 1,
            Self::Invert => -1,
            Self::Zero => 0,
        }
    }

    /// Returns the opposite sign; `Zero` stays `Zero`.
    #[must_use]
    pub const fn negated(self) -> Self {
        match self {
            Self::Natural => Self::Invert,
            Self::Invert => Self::Natural,
            Self::Zero => Self::Zero,
        }
    }

    /// Stable byte used by the binary graph and canonical encodings.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Zero => 0,
            Self::Natural => 1,
            Self::Invert => 2,
        }
    }

    /// Decodes a byte produced by [`Sign::code`].
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Zero),
            1 => Some(Self::Natural),
            2 => Some(Self::Invert),
            _ => None,
        }
    }

    /// ASCII glyph: blank for natural, `_` for inverted, `0` for zero.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Natural => ' ',
            Self::Invert => '_',
            Self::Zero => '0',
        }
    }
}

/// One of a vertex's three edge slots.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct EdgeSlot {
    /// Target vertex, or `0` for an inward slot.
    pub to: VtxId,
    /// Sign applied to walks through this slot.
    pub sign: Sign,
}

impl EdgeSlot {
    /// Returns `true` when the slot is not yet joined to another vertex.
    #[must_use]
    #[rustfmt::skip]
    pub const fn is_open(&self) -> bool { self.to == 0 }
}

/// A graph vertex with a fixed number of edge slots.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Vertex {
    /// One-based identifier of this vertex.
    pub id: VtxId,
    /// The vertex's edge slots.
    pub edges: [EdgeSlot; SLOTS_PER_VERTEX],
}

impl Vertex {
    /// Creates a vertex whose slots are all inward with natural sign.
    #[must_use]
    pub const fn new(id: VtxId) -> Self {
        Self {
            id,
            edges: [EdgeSlot {
                to: 0,
                sign: Sign::Natural,
            }; SLOTS_PER_VERTEX],
        }
    }

    /// Returns the one-based index of the first open slot.
    #[must_use]
    pub fn first_open_slot(&self) -> Option<u8> {
        self.edges
            .iter()
            .position(EdgeSlot::is_open)
            .and_then(|idx| u8::try_from(idx + 1).ok())
    }

    /// Returns the vertex id that walks through `slot` read from.
    ///
    /// Inward slots read the vertex's own state.
    #[must_use]
    pub const fn source_of(&self, slot: &EdgeSlot) -> VtxId {
        if slot.to == 0 { self.id } else { slot.to }
    }

    /// Iterates `(slot_index, slot)` pairs for slots joined to a
    /// higher-numbered vertex, visiting each undirected edge once.
    pub fn forward_edges(&self) -> impl Iterator<Item = (u8, &EdgeSlot)> + '_ {
        self.edges
            .iter()
            .zip(1_u8..)
            .filter(move |(slot, _)| slot.to > self.id)
            .map(|(slot, idx)| (idx, slot))
    }
}
