//! Composite identifiers for stored trace vectors.

use std::fmt;

const SEQ_BITS: u32 = 48;
const SEQ_MASK: u64 = (1 << SEQ_BITS) - 1;

/// Identifies a trace vector by vertex count and per-count sequence number.
///
/// The vertex count occupies bits 48..56 and the sequence the low 48 bits.
/// Ids are issued by the catalog, never reused, and order first by vertex
/// count then by sequence.
///
/// # Examples
/// ```
/// use fine2x3_core::TracesId;
///
/// let id = TracesId::new(4, 17);
/// assert_eq!(id.vertex_count(), 4);
/// assert_eq!(id.seq(), 17);
/// assert_eq!(id.to_string(), "4-17");
/// assert_eq!(TracesId::unmarshal(&id.marshal()), Some(id));
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TracesId(u64);

impl TracesId {
    /// Byte length of the marshalled form.
    pub const ENCODED_LEN: usize = 7;

    /// Forms an id from a vertex count and sequence number.
    ///
    /// Sequence bits above 48 are discarded.
    #[must_use]
    pub const fn new(vertex_count: u8, seq: u64) -> Self {
        Self(((vertex_count as u64) << SEQ_BITS) | (seq & SEQ_MASK))
    }

    /// Vertex count of the graphs carrying these traces.
    #[must_use]
    pub const fn vertex_count(self) -> u8 {
        ((self.0 >> SEQ_BITS) & 0xFF) as u8
    }

    /// Per-vertex-count sequence number.
    #[must_use]
    pub const fn seq(self) -> u64 {
        self.0 & SEQ_MASK
    }

    /// Raw 64-bit representation.
    #[must_use]
    #[rustfmt::skip]
    pub const fn get(self) -> u64 { self.0 }

    /// Encodes the id as seven big-endian bytes.
    #[must_use]
    pub const fn marshal(self) -> [u8; Self::ENCODED_LEN] {
        let raw = self.0;
        [
            (raw >> 48) as u8,
            (raw >> 40) as u8,
            (raw >> 32) as u8,
            (raw >> 24) as u8,
            (raw >> 16) as u8,
            (raw >> 8) as u8,
            raw as u8,
        ]
    }

    /// Decodes the first seven bytes of `bytes`, returning `None` when fewer
    /// are available.
    #[must_use]
    pub fn unmarshal(bytes: &[u8]) -> Option<Self> {
        let head = bytes.get(..Self::ENCODED_LEN)?;
        let raw = head
            .iter()
            .fold(0_u64, |acc, &byte| (acc << 8) | u64::from(byte));
        Some(Self(raw))
    }
}

impl fmt::Display for TracesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.vertex_count(), self.seq())
    }
}
