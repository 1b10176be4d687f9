//! Error types for the fine2x3 core library.
//!
//! Each subsystem exposes its own error enum together with a stable,
//! machine-readable code enum generated by `define_error_codes!`.

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::graph::{GrowOp, VtxId};

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? $( ( $($tuple:tt)* ) )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? $( ( $($tuple)* ) )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced while building or decoding a graph.
///
/// The `part` fields identify the offending edge (or op) by its zero-based
/// position in the caller's input so front ends can point at it.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GraphError {
    /// A graph must contain at least one vertex.
    #[error("graph must contain at least one vertex")]
    EmptyGraph,
    /// The vertex count exceeds the supported maximum.
    #[error("graph has {got} vertices but at most {max} are supported")]
    TooManyVertices {
        /// Requested vertex count.
        got: usize,
        /// Largest supported vertex count.
        max: usize,
    },
    /// An edge referenced a vertex outside `1..=vertex_count`.
    #[error("part {part}: vertex {vertex} is outside 1..={vertex_count}")]
    VertexOutOfRange {
        /// Zero-based index of the offending edge.
        part: usize,
        /// The referenced vertex id.
        vertex: VtxId,
        /// Number of vertices declared by the graph.
        vertex_count: usize,
    },
    /// An edge needed a slot on a vertex whose three slots were already used.
    #[error("part {part}: vertex {vertex} has no free edge slot")]
    SlotsExhausted {
        /// Zero-based index of the offending edge.
        part: usize,
        /// The saturated vertex.
        vertex: VtxId,
    },
    /// An edge slot points at a vertex that does not point back.
    #[error("vertex {vertex} slot {slot} targets vertex {target} without a reciprocal slot")]
    BrokenEdge {
        /// Vertex holding the dangling slot.
        vertex: VtxId,
        /// One-based slot index on `vertex`.
        slot: u8,
        /// Target vertex lacking the reciprocal slot.
        target: VtxId,
    },
    /// The two ends of an edge carry different signs.
    #[error("vertex {vertex} slot {slot} and its pair on vertex {target} carry different signs")]
    SignMismatch {
        /// Vertex holding the slot.
        vertex: VtxId,
        /// One-based slot index on `vertex`.
        slot: u8,
        /// Vertex holding the paired slot.
        target: VtxId,
    },
    /// A sign byte was not one of the recognised encodings.
    #[error("part {part}: unknown edge sign code {code:#04x}")]
    InvalidSign {
        /// Zero-based index of the offending edge.
        part: usize,
        /// Raw sign byte.
        code: u8,
    },
    /// An encoded graph ended before all declared content was read.
    #[error("graph encoding is truncated: expected {expected} bytes, got {got}")]
    Truncated {
        /// Number of bytes required by the header.
        expected: usize,
        /// Number of bytes supplied.
        got: usize,
    },
    /// Replaying a grow op failed.
    #[error("step {step}: grow op {op} could not be applied")]
    RejectedOp {
        /// Zero-based index of the rejected op.
        step: usize,
        /// The rejected op.
        op: GrowOp,
    },
}

define_error_codes! {
    /// Stable codes describing [`GraphError`] variants.
    enum GraphErrorCode for GraphError {
        /// A graph must contain at least one vertex.
        EmptyGraph => EmptyGraph => "GRAPH_EMPTY",
        /// The vertex count exceeds the supported maximum.
        TooManyVertices => TooManyVertices { .. } => "GRAPH_TOO_MANY_VERTICES",
        /// An edge referenced a vertex outside the graph.
        VertexOutOfRange => VertexOutOfRange { .. } => "GRAPH_VERTEX_OUT_OF_RANGE",
        /// An edge needed a slot on a saturated vertex.
        SlotsExhausted => SlotsExhausted { .. } => "GRAPH_SLOTS_EXHAUSTED",
        /// An edge slot lacks its reciprocal.
        BrokenEdge => BrokenEdge { .. } => "GRAPH_BROKEN_EDGE",
        /// Paired slots carry different signs.
        SignMismatch => SignMismatch { .. } => "GRAPH_SIGN_MISMATCH",
        /// A sign byte was not recognised.
        InvalidSign => InvalidSign { .. } => "GRAPH_INVALID_SIGN",
        /// An encoded graph was truncated.
        Truncated => Truncated { .. } => "GRAPH_TRUNCATED",
        /// Replaying a grow op failed.
        RejectedOp => RejectedOp { .. } => "GRAPH_REJECTED_OP",
    }
}

/// An error produced while decoding a canonical graph encoding.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum CanonError {
    /// The encoding declared zero groups or was empty.
    #[error("canonical encoding contains no vertex groups")]
    Empty,
    /// The encoding length does not match the declared group count.
    #[error("canonical encoding has {got} bytes but its group count requires {expected}")]
    LengthMismatch {
        /// Byte length implied by the declared group count.
        expected: usize,
        /// Actual byte length.
        got: usize,
    },
    /// A group declared a multiplicity of zero.
    #[error("group {group} has a zero multiplicity")]
    ZeroMultiplicity {
        /// Zero-based group index.
        group: usize,
    },
    /// A family-edge code was not recognised.
    #[error("group {group} has unknown edge family code {code:#04x}")]
    UnknownFamily {
        /// Zero-based group index.
        group: usize,
        /// Raw family byte.
        code: u8,
    },
    /// An edge-sign code was not recognised.
    #[error("group {group} has unknown edge sign code {code:#04x}")]
    UnknownSign {
        /// Zero-based group index.
        group: usize,
        /// Raw sign byte.
        code: u8,
    },
    /// A cycle-group id or family target referenced a group that does not exist.
    #[error("group {group} references cycle group {id} but only {max} exist")]
    GroupOutOfRange {
        /// Zero-based group index.
        group: usize,
        /// Referenced cycle-group id.
        id: u8,
        /// Largest cycle-group id present.
        max: u8,
    },
    /// The multiplicities sum past the supported vertex count.
    #[error("canonical encoding describes {got} vertices but at most {max} are supported")]
    TooManyVertices {
        /// Total multiplicity.
        got: usize,
        /// Largest supported vertex count.
        max: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`CanonError`] variants.
    enum CanonErrorCode for CanonError {
        /// The encoding declared zero groups or was empty.
        Empty => Empty => "CANON_EMPTY",
        /// The encoding length does not match the declared group count.
        LengthMismatch => LengthMismatch { .. } => "CANON_LENGTH_MISMATCH",
        /// A group declared a multiplicity of zero.
        ZeroMultiplicity => ZeroMultiplicity { .. } => "CANON_ZERO_MULTIPLICITY",
        /// A family-edge code was not recognised.
        UnknownFamily => UnknownFamily { .. } => "CANON_UNKNOWN_FAMILY",
        /// An edge-sign code was not recognised.
        UnknownSign => UnknownSign { .. } => "CANON_UNKNOWN_SIGN",
        /// A group reference was out of range.
        GroupOutOfRange => GroupOutOfRange { .. } => "CANON_GROUP_OUT_OF_RANGE",
        /// The multiplicities describe too many vertices.
        TooManyVertices => TooManyVertices { .. } => "CANON_TOO_MANY_VERTICES",
    }
}

/// An error produced when configuring or starting an enumeration run.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EnumError {
    /// The vertex cap must lie within `1..=MAX_VERTEX_COUNT`.
    #[error("vertex_max must be within 1..={max} (got {got})")]
    InvalidVertexMax {
        /// The rejected cap.
        got: usize,
        /// Largest supported cap.
        max: usize,
    },
    /// The producer thread could not be spawned.
    #[error("failed to spawn the enumeration worker: {source}")]
    Spawn {
        /// Error raised by the operating system.
        #[source]
        source: std::io::Error,
    },
}

define_error_codes! {
    /// Stable codes describing [`EnumError`] variants.
    enum EnumErrorCode for EnumError {
        /// The vertex cap was out of range.
        InvalidVertexMax => InvalidVertexMax { .. } => "ENUM_INVALID_VERTEX_MAX",
        /// The producer thread could not be spawned.
        Spawn => Spawn { .. } => "ENUM_SPAWN_FAILED",
    }
}

/// An error raised by a [`crate::CatalogStore`] implementation.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum StoreError {
    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("catalog store lock was poisoned")]
    Poisoned,
    /// The backing store reported a failure.
    #[error("catalog store failed: {message}")]
    Backend {
        /// Backend-specific description.
        message: Arc<str>,
    },
}

define_error_codes! {
    /// Stable codes describing [`StoreError`] variants.
    enum StoreErrorCode for StoreError {
        /// A lock guarding the store was poisoned.
        Poisoned => Poisoned => "STORE_POISONED",
        /// The backing store reported a failure.
        Backend => Backend { .. } => "STORE_BACKEND",
    }
}

/// An error produced by [`crate::Catalog`] operations.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum CatalogError {
    /// The stored catalog was written by an incompatible version.
    #[error("catalog version {major}.{minor} is incompatible")]
    VersionMismatch {
        /// Stored major version.
        major: u32,
        /// Stored minor version.
        minor: u32,
    },
    /// The stored catalog keeps fewer traces than requested.
    #[error("catalog stores {stored} traces per entry but {requested} were requested")]
    TraceCountTooLow {
        /// Trace count persisted in the catalog.
        stored: usize,
        /// Trace count requested by the caller.
        requested: usize,
    },
    /// The requested trace count exceeds what a catalog can store.
    #[error("trace count {requested} exceeds the maximum of {max}")]
    TraceCountTooHigh {
        /// Trace count requested by the caller or found in stored state.
        requested: usize,
        /// Largest supported trace count.
        max: usize,
    },
    /// A prime catalog was requested but the stored catalog is not one.
    #[error("catalog was not created as a prime catalog")]
    NotPrimeCatalog,
    /// The persisted catalog state could not be decoded.
    #[error("catalog state is corrupt: {message}")]
    CorruptState {
        /// Decoder diagnostic.
        message: Arc<str>,
    },
    /// A stored key or value did not follow the catalog layout.
    #[error("catalog record is corrupt: {reason}")]
    CorruptRecord {
        /// Description of the inconsistency.
        reason: &'static str,
    },
    /// A graph is larger than the catalog's trace count can describe.
    #[error("graph has {vertex_count} vertices but the catalog keeps {trace_count} traces")]
    GraphTooLarge {
        /// Vertex count of the rejected graph.
        vertex_count: usize,
        /// Trace count configured for the catalog.
        trace_count: usize,
    },
    /// A stored graph definition failed to decode.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

define_error_codes! {
    /// Stable codes describing [`CatalogError`] variants.
    enum CatalogErrorCode for CatalogError {
        /// The stored catalog was written by an incompatible version.
        VersionMismatch => VersionMismatch { .. } => "CATALOG_VERSION_MISMATCH",
        /// The stored catalog keeps fewer traces than requested.
        TraceCountTooLow => TraceCountTooLow { .. } => "CATALOG_TRACE_COUNT_TOO_LOW",
        /// The trace count exceeds the supported maximum.
        TraceCountTooHigh => TraceCountTooHigh { .. } => "CATALOG_TRACE_COUNT_TOO_HIGH",
        /// A prime catalog was requested but the stored catalog is not one.
        NotPrimeCatalog => NotPrimeCatalog => "CATALOG_NOT_PRIME_CATALOG",
        /// The persisted state could not be decoded.
        CorruptState => CorruptState { .. } => "CATALOG_CORRUPT_STATE",
        /// A stored record did not follow the catalog layout.
        CorruptRecord => CorruptRecord { .. } => "CATALOG_CORRUPT_RECORD",
        /// A graph is larger than the catalog's trace count.
        GraphTooLarge => GraphTooLarge { .. } => "CATALOG_GRAPH_TOO_LARGE",
        /// A stored graph definition failed to decode.
        Graph => Graph(..) => "CATALOG_GRAPH",
        /// The backing store failed.
        Store => Store(..) => "CATALOG_STORE",
    }
}

impl CatalogError {
    /// Retrieve the inner [`StoreErrorCode`] when the error originated in the store.
    #[must_use]
    pub const fn store_code(&self) -> Option<StoreErrorCode> {
        match self {
            Self::Store(error) => Some(error.code()),
            _ => None,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T, E = GraphError> = core::result::Result<T, E>;
