//! Resolved vertex/edge lists and their binary form.
//!
//! A [`GraphDef`] is the adapter through which external representations
//! (parsed expressions, adjacency data, stored catalog values) become
//! [`Construction`](super::Construction)s.

use std::fmt;

use crate::error::{GraphError, Result};

use super::vertex::{MAX_VERTEX_COUNT, Sign, VtxId};

/// A single edge between `a` and `b`; `a == b` is a loop using one slot.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct EdgeDef {
    /// First endpoint.
    pub a: VtxId,
    /// Second endpoint.
    pub b: VtxId,
    /// Sign carried by the edge.
    pub sign: Sign,
}

impl EdgeDef {
    /// Creates a natural-sign edge.
    #[must_use]
    pub const fn new(a: VtxId, b: VtxId) -> Self {
        Self {
            a,
            b,
            sign: Sign::Natural,
        }
    }

    /// Returns the edge with the given sign.
    #[must_use]
    pub const fn with_sign(mut self, sign: Sign) -> Self {
        self.sign = sign;
        self
    }

    /// Returns `true` for a loop.
    #[must_use]
    #[rustfmt::skip]
    pub const fn is_loop(&self) -> bool { self.a == self.b }
}

impl fmt::Display for EdgeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let link = match self.sign {
            Sign::Natural => '-',
            Sign::Invert => '~',
            Sign::Zero => '.',
        };
        write!(f, "{}{link}{}", self.a, self.b)
    }
}

/// A fully resolved graph: a vertex count and an edge list.
///
/// Slots not covered by `edges` are natural loops, so a bare vertex count
/// describes isolated vertices.
///
/// # Examples
/// ```
/// use fine2x3_core::{EdgeDef, GraphDef, Sign};
///
/// let def = GraphDef::new(2, vec![EdgeDef::new(1, 2), EdgeDef::new(1, 2).with_sign(Sign::Invert)]);
/// assert_eq!(def.to_string(), "1-2,1~2");
/// let bytes = def.encode();
/// assert_eq!(GraphDef::decode(&bytes)?, def);
/// # Ok::<(), fine2x3_core::GraphError>(())
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct GraphDef {
    vertex_count: usize,
    edges: Vec<EdgeDef>,
}

impl GraphDef {
    /// Creates a definition; validation happens on conversion.
    #[must_use]
    pub const fn new(vertex_count: usize, edges: Vec<EdgeDef>) -> Self {
        Self {
            vertex_count,
            edges,
        }
    }

    /// Creates a definition from natural-sign `(a, b)` pairs.
    #[must_use]
    pub fn natural(vertex_count: usize, pairs: &[(VtxId, VtxId)]) -> Self {
        let edges = pairs.iter().map(|&(a, b)| EdgeDef::new(a, b)).collect();
        Self::new(vertex_count, edges)
    }

    /// Number of declared vertices.
    #[must_use]
    #[rustfmt::skip]
    pub const fn vertex_count(&self) -> usize { self.vertex_count }

    /// Declared edges in input order.
    #[must_use]
    #[rustfmt::skip]
    pub fn edges(&self) -> &[EdgeDef] { &self.edges }

    /// Encodes as `[vertex_count, (a, b, sign)*]`.
    ///
    /// # Panics
    /// Panics when the vertex count exceeds 255; such definitions can never be
    /// converted into a construction.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let count = u8::try_from(self.vertex_count)
            .unwrap_or_else(|_| panic!("vertex count {} does not fit a byte", self.vertex_count));
        let mut out = Vec::with_capacity(1 + self.edges.len() * 3);
        out.push(count);
        for edge in &self.edges {
            out.extend_from_slice(&[edge.a, edge.b, edge.sign.code()]);
        }
        out
    }

    /// Decodes bytes written by [`GraphDef::encode`].
    ///
    /// # Errors
    /// Returns [`GraphError::Truncated`] when the edge records are incomplete
    /// and [`GraphError::InvalidSign`] for an unknown sign byte.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let Some((&count, body)) = bytes.split_first() else {
            return Err(GraphError::Truncated {
                expected: 1,
                got: 0,
            });
        };
        if body.len() % 3 != 0 {
            return Err(GraphError::Truncated {
                expected: 1 + body.len().next_multiple_of(3),
                got: bytes.len(),
            });
        }
        let edges = body
            .chunks_exact(3)
            .enumerate()
            .map(|(part, record)| {
                let sign = Sign::from_code(record[2]).ok_or(GraphError::InvalidSign {
                    part,
                    code: record[2],
                })?;
                Ok(EdgeDef::new(record[0], record[1]).with_sign(sign))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(usize::from(count), edges))
    }

    /// Appends `other` as a disjoint component, renumbering its vertices
    /// after this definition's.
    ///
    /// Traces are additive over disjoint components, so the result carries
    /// the sum of both trace vectors.
    ///
    /// # Errors
    /// Returns [`GraphError::TooManyVertices`] when the combined vertex count
    /// exceeds [`MAX_VERTEX_COUNT`], and [`GraphError::VertexOutOfRange`]
    /// naming the part of `other` whose endpoint lies outside
    /// `1..=other.vertex_count()`. `self` is left unchanged on error.
    pub fn concat(&mut self, other: &Self) -> Result<()> {
        let total = self.vertex_count + other.vertex_count;
        let offset = match VtxId::try_from(self.vertex_count) {
            Ok(offset) if total <= MAX_VERTEX_COUNT => offset,
            _ => {
                return Err(GraphError::TooManyVertices {
                    got: total,
                    max: MAX_VERTEX_COUNT,
                });
            }
        };
        for (part, edge) in other.edges.iter().enumerate() {
            for vertex in [edge.a, edge.b] {
                if vertex == 0 || usize::from(vertex) > other.vertex_count {
                    return Err(GraphError::VertexOutOfRange {
                        part,
                        vertex,
                        vertex_count: other.vertex_count,
                    });
                }
            }
        }
        // Endpoints are now at most `other.vertex_count`, so the sums stay
        // within `MAX_VERTEX_COUNT`.
        self.edges.extend(other.edges.iter().map(|edge| {
            EdgeDef::new(edge.a + offset, edge.b + offset).with_sign(edge.sign)
        }));
        self.vertex_count = total;
        Ok(())
    }

    /// Checks the vertex count against the supported range.
    pub(crate) fn check_vertex_count(&self) -> Result<()> {
        if self.vertex_count == 0 {
            return Err(GraphError::EmptyGraph);
        }
        if self.vertex_count > MAX_VERTEX_COUNT {
            return Err(GraphError::TooManyVertices {
                got: self.vertex_count,
                max: MAX_VERTEX_COUNT,
            });
        }
        Ok(())
    }
}

impl fmt::Display for GraphDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, edge) in self.edges.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{edge}")?;
        }
        Ok(())
    }
}
