//! Canonical group lists and their binary and ASCII encodings.
//!
//! The binary layout for `n` groups is
//!
//! ```text
//! [n] [family codes: 3 per group] [cycle group ids: 1 per group]
//!     [sign codes: 3 per group] [multiplicities: 1 per group]
//! ```
//!
//! so an encoding is always `1 + 8n` bytes long.

use std::fmt;

use crate::{
    error::CanonError,
    graph::{MAX_VERTEX_COUNT, SLOTS_PER_VERTEX, Sign},
};

const FAMILY_LOOP_VTX: u8 = 0;
const FAMILY_LOOP_GROUP: u8 = 1;
const BYTES_PER_GROUP: usize = 2 * SLOTS_PER_VERTEX + 2;

/// Where an edge of a canonical vertex leads, relative to its cycle group.
///
/// Variants order as declared, with cross-group edges ordered by target id.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum EdgeFamily {
    /// The slot folds back onto the vertex itself.
    LoopVtx,
    /// The edge joins another vertex of the same cycle group.
    LoopGroup,
    /// The edge joins a vertex of the given (one-based) cycle group.
    Group(u8),
}

impl EdgeFamily {
    /// Byte used in the binary encoding.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::LoopVtx => FAMILY_LOOP_VTX,
            Self::LoopGroup => FAMILY_LOOP_GROUP,
            Self::Group(id) => FAMILY_LOOP_GROUP + id,
        }
    }

    /// Glyph used in the ASCII encoding: `o`, `O`, or the group's letter.
    #[must_use]
    pub fn glyph(self) -> char {
        match self {
            Self::LoopVtx => 'o',
            Self::LoopGroup => 'O',
            Self::Group(id) => group_letter(id),
        }
    }
}

fn group_letter(id: u8) -> char {
    char::from(b'A' + id.saturating_sub(1))
}

/// A run of structurally identical vertices.
///
/// The derived order compares fields in declaration order, so groups sort
/// by cycle group before edge descriptors.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct CanonicalGroup {
    /// One-based cycle group shared by the run's vertices.
    pub cycle_group: u8,
    /// Edge descriptors, sorted by family then sign.
    pub edges: [(EdgeFamily, Sign); SLOTS_PER_VERTEX],
    /// Number of vertices in the run.
    pub count: u8,
}

impl CanonicalGroup {
    fn same_shape(&self, other: &Self) -> bool {
        self.cycle_group == other.cycle_group && self.edges == other.edges
    }
}

/// A relabelling-invariant description of a graph.
///
/// # Examples
/// ```
/// use fine2x3_core::{CanonicalForm, Construction, GrowOp, OpCode, canonicalise};
///
/// let mut graph = Construction::new();
/// graph.grow(GrowOp::seed());
/// graph.grow(GrowOp::new(OpCode::Sprout, 1, 1));
/// let form = canonicalise(&graph);
/// assert_eq!(form.to_string(), "2ooO 2   ");
///
/// let bytes = form.encode();
/// assert_eq!(CanonicalForm::recanonicalise(&bytes)?, bytes);
/// # Ok::<(), fine2x3_core::CanonError>(())
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct CanonicalForm {
    groups: Vec<CanonicalGroup>,
}

impl CanonicalForm {
    /// Builds a form from groups in any order, normalising them.
    #[must_use]
    pub fn from_groups(groups: Vec<CanonicalGroup>) -> Self {
        let mut form = Self { groups };
        form.normalize();
        form
    }

    /// Borrows the group list.
    #[must_use]
    #[rustfmt::skip]
    pub fn groups(&self) -> &[CanonicalGroup] { &self.groups }

    /// Total number of vertices described.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.groups.iter().map(|group| usize::from(group.count)).sum()
    }

    /// Sorts edges and groups canonically and merges adjacent identical
    /// groups.
    pub fn normalize(&mut self) {
        for group in &mut self.groups {
            group.edges.sort_unstable();
        }
        self.groups.sort_unstable();
        let mut merged: Vec<CanonicalGroup> = Vec::with_capacity(self.groups.len());
        for group in self.groups.drain(..) {
            match merged.last_mut() {
                Some(last) if last.same_shape(&group) => {
                    last.count = last.count.saturating_add(group.count);
                }
                _ => merged.push(group),
            }
        }
        self.groups = merged;
    }

    /// Appends the binary encoding to `out`.
    ///
    /// The group count is written as a single byte; forms built from a
    /// construction never exceed [`MAX_VERTEX_COUNT`] groups.
    pub fn append_to(&self, out: &mut Vec<u8>) {
        out.reserve(1 + self.groups.len() * BYTES_PER_GROUP);
        out.push(self.groups.len() as u8);
        for group in &self.groups {
            out.extend(group.edges.iter().map(|(family, _)| family.code()));
        }
        out.extend(self.groups.iter().map(|group| group.cycle_group));
        for group in &self.groups {
            out.extend(group.edges.iter().map(|(_, sign)| sign.code()));
        }
        out.extend(self.groups.iter().map(|group| group.count));
    }

    /// Returns the binary encoding.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.append_to(&mut out);
        out
    }

    /// Renders the human-readable form: a family section then a sign section,
    /// each listing one token per group prefixed by its multiplicity (blank
    /// for one).
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(self.groups.len() * 10);
        let push_count = |out: &mut String, count: u8| {
            if count == 1 {
                out.push(' ');
            } else {
                out.push_str(&count.to_string());
            }
        };
        for group in &self.groups {
            push_count(&mut out, group.count);
            out.extend(group.edges.iter().map(|(family, _)| family.glyph()));
            out.push(' ');
        }
        for group in &self.groups {
            push_count(&mut out, group.count);
            out.extend(group.edges.iter().map(|(_, sign)| sign.glyph()));
            out.push(' ');
        }
        out.pop();
        out
    }

    /// Decodes and validates a binary encoding without reordering it.
    ///
    /// # Errors
    /// Returns a [`CanonError`] describing the first inconsistency found.
    pub fn decode(bytes: &[u8]) -> Result<Self, CanonError> {
        let Some((&declared, body)) = bytes.split_first() else {
            return Err(CanonError::Empty);
        };
        let group_count = usize::from(declared);
        if group_count == 0 {
            return Err(CanonError::Empty);
        }
        let expected = 1 + group_count * BYTES_PER_GROUP;
        if bytes.len() != expected {
            return Err(CanonError::LengthMismatch {
                expected,
                got: bytes.len(),
            });
        }

        let (families, rest) = body.split_at(group_count * SLOTS_PER_VERTEX);
        let (cycle_groups, rest) = rest.split_at(group_count);
        let (signs, counts) = rest.split_at(group_count * SLOTS_PER_VERTEX);
        let max_group = cycle_groups.iter().copied().max().unwrap_or(0);

        let mut total = 0_usize;
        let mut groups = Vec::with_capacity(group_count);
        for (group, ((&cycle_group, &count), (family_codes, sign_codes))) in cycle_groups
            .iter()
            .zip(counts)
            .zip(
                families
                    .chunks_exact(SLOTS_PER_VERTEX)
                    .zip(signs.chunks_exact(SLOTS_PER_VERTEX)),
            )
            .enumerate()
        {
            if count == 0 {
                return Err(CanonError::ZeroMultiplicity { group });
            }
            total += usize::from(count);
            if cycle_group == 0 {
                return Err(CanonError::GroupOutOfRange {
                    group,
                    id: cycle_group,
                    max: max_group,
                });
            }
            let mut edges = [(EdgeFamily::LoopVtx, Sign::Natural); SLOTS_PER_VERTEX];
            for (edge, (&family_code, &sign_code)) in
                edges.iter_mut().zip(family_codes.iter().zip(sign_codes))
            {
                let family = decode_family(group, family_code, max_group)?;
                let sign = Sign::from_code(sign_code).ok_or(CanonError::UnknownSign {
                    group,
                    code: sign_code,
                })?;
                *edge = (family, sign);
            }
            groups.push(CanonicalGroup {
                cycle_group,
                edges,
                count,
            });
        }
        if total > MAX_VERTEX_COUNT {
            return Err(CanonError::TooManyVertices {
                got: total,
                max: MAX_VERTEX_COUNT,
            });
        }
        Ok(Self { groups })
    }

    /// Decodes `bytes`, normalises the result, and re-encodes it.
    ///
    /// A canonical encoding comes back byte-identical.
    ///
    /// # Errors
    /// Returns a [`CanonError`] when `bytes` is not a valid encoding.
    pub fn recanonicalise(bytes: &[u8]) -> Result<Vec<u8>, CanonError> {
        let mut form = Self::decode(bytes)?;
        form.normalize();
        Ok(form.encode())
    }
}

fn decode_family(group: usize, code: u8, max_group: u8) -> Result<EdgeFamily, CanonError> {
    match code {
        FAMILY_LOOP_VTX => Ok(EdgeFamily::LoopVtx),
        FAMILY_LOOP_GROUP => Ok(EdgeFamily::LoopGroup),
        _ => {
            let id = code - FAMILY_LOOP_GROUP;
            if usize::from(id) > MAX_VERTEX_COUNT {
                Err(CanonError::UnknownFamily { group, code })
            } else if id > max_group {
                Err(CanonError::GroupOutOfRange {
                    group,
                    id,
                    max: max_group,
                })
            } else {
                Ok(EdgeFamily::Group(id))
            }
        }
    }
}

impl fmt::Display for CanonicalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ascii())
    }
}
