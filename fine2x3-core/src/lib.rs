//! Enumeration, canonicalisation, and cataloguing of 2x3 graphs.
//!
//! A 2x3 graph gives every vertex three edge slots. Slots are joined by
//! signed edges or left open; open slots count as walks of their own, so a
//! graph's *traces*, the signed counts of closed walks of each length, are a
//! cheap invariant that separates most non-isomorphic graphs.
//!
//! The crate is organised bottom-up:
//!
//! - [`graph`] holds constructions grown one op at a time, plain
//!   definitions, and pools for recycling them.
//! - [`traces`] computes trace vectors and their key encodings.
//! - [`canon`] produces the canonical form used to tell graphs apart.
//! - [`walker`] enumerates every graph up to a vertex cap.
//! - [`factor`] splits trace vectors into sums of prime ones.
//! - [`catalog`] stores graphs under their traces and answers queries.
//!
//! ```
//! use fine2x3_core::{CatalogOpts, EnumOpts, MemoryStore, enumerate};
//!
//! let catalog = CatalogOpts::new()
//!     .with_trace_count(4)
//!     .with_primes(true)
//!     .open(MemoryStore::new())?;
//! let summary = enumerate(EnumOpts::new(2))?.add_to(&catalog)?;
//! assert_eq!(summary.new_traces(), 4);
//! assert_eq!(catalog.num_primes(2)?, 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod canon;
pub mod catalog;
mod error;
pub mod factor;
pub mod graph;
pub mod traces;
pub mod walker;

#[cfg(test)]
mod test_utils;

pub use crate::{
    canon::{CanonicalForm, canonicalise, graph_key},
    catalog::{
        AddOutcome, AddSummary, Catalog, CatalogOpts, CatalogStore, DEFAULT_TRACE_COUNT,
        Factorization, MAX_TRACE_COUNT, MemoryStore, Selector, StoreTxn, StoredEntry, TracesEntry, TracesFlags,
    },
    error::{
        CanonError, CanonErrorCode, CatalogError, CatalogErrorCode, EnumError, EnumErrorCode,
        GraphError, GraphErrorCode, Result, StoreError, StoreErrorCode,
    },
    factor::{FactorCatalog, FactorMessage, FactorRun, FactorSet, Factorizations},
    graph::{
        Construction, ConstructionPool, EdgeDef, GraphDef, GrowOp, MAX_VERTEX_COUNT, OpCode,
        Pooled, Sign,
    },
    traces::{Traces, TracesId},
    walker::{
        CancelToken, DropDuplicates, EdgeSignPermutations, EnumOpts, EnumStream, GraphWalker,
        StreamSelector, WalkSummary, WalkerVariant, all_edge_signs, enumerate, permute_edge_signs,
    },
};
