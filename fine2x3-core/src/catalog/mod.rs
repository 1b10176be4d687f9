//! A catalog of enumerated graphs keyed by their traces.
//!
//! Every distinct trace vector owns a header record; graphs sharing it are
//! stored beneath, keyed by their canonical encoding:
//!
//! ```text
//! [0, 0, 1]                              => catalog state (JSON)
//! [nv] traces-varints [0, 0]             => traces id [+ prime id], meta = flags
//! [nv] traces-varints [0, 0] canonical   => graph definition
//! ```
//!
//! Header keys of one vertex count sort together, and a header sorts
//! immediately before its graphs, so prefix scans visit each header followed
//! by the graphs carrying it.

mod state;
mod store;

use std::{
    num::NonZeroUsize,
    ops::ControlFlow,
    sync::{Mutex, MutexGuard},
};

use lru::LruCache;
#[cfg(feature = "cpu")]
use rayon::prelude::*;
use tracing::{debug, info, instrument};

pub use store::{CatalogStore, MemoryStore, StoreTxn, StoredEntry};

use self::state::{CatalogState, MAJOR_VERSION, MINOR_VERSION, STATE_KEY};
use crate::{
    canon::canonicalise,
    error::{CatalogError, GraphError, StoreError},
    factor::{FactorCatalog, FactorSet},
    graph::{Construction, GraphDef, MAX_VERTEX_COUNT},
    traces::{Traces, TracesId, codec},
};

/// Trace count used when none is requested.
pub const DEFAULT_TRACE_COUNT: usize = 12;

/// Largest trace count a catalog accepts.
pub const MAX_TRACE_COUNT: usize = u8::MAX as usize;

const DEFAULT_HEADER_CACHE: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};

/// Classification flags stored in a traces header's metadata byte.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct TracesFlags(u8);

impl TracesFlags {
    /// The traces have no decomposition into smaller primes.
    pub const PRIME: Self = Self(0x01);
    /// Every trace of odd walk length is zero.
    pub const BOSON: Self = Self(0x02);

    /// No flags set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    #[rustfmt::skip]
    pub const fn from_bits(bits: u8) -> Self { Self(bits) }

    #[must_use]
    #[rustfmt::skip]
    pub const fn bits(self) -> u8 { self.0 }

    /// Returns the union of both flag sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns `true` when every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    #[rustfmt::skip]
    pub const fn is_prime(self) -> bool { self.contains(Self::PRIME) }

    #[must_use]
    #[rustfmt::skip]
    pub const fn is_boson(self) -> bool { self.contains(Self::BOSON) }
}

/// The header stored for a distinct trace vector.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TracesEntry {
    traces_id: TracesId,
    prime_id: Option<TracesId>,
    flags: TracesFlags,
}

impl TracesEntry {
    #[must_use]
    #[rustfmt::skip]
    pub const fn traces_id(&self) -> TracesId { self.traces_id }

    /// Prime id, present exactly when the traces are prime.
    #[must_use]
    #[rustfmt::skip]
    pub const fn prime_id(&self) -> Option<TracesId> { self.prime_id }

    #[must_use]
    #[rustfmt::skip]
    pub const fn flags(&self) -> TracesFlags { self.flags }

    fn to_stored(self) -> StoredEntry {
        let mut value = Vec::with_capacity(2 * TracesId::ENCODED_LEN);
        value.extend_from_slice(&self.traces_id.marshal());
        if let Some(prime_id) = self.prime_id {
            value.extend_from_slice(&prime_id.marshal());
        }
        StoredEntry::new(self.flags.bits(), value)
    }

    fn from_stored(stored: &StoredEntry) -> Result<Self, CatalogError> {
        let flags = TracesFlags::from_bits(stored.meta);
        let (head, tail) = stored
            .value
            .split_at_checked(TracesId::ENCODED_LEN)
            .ok_or(CatalogError::CorruptRecord {
                reason: "traces header is too short",
            })?;
        let traces_id = TracesId::unmarshal(head).ok_or(CatalogError::CorruptRecord {
            reason: "traces header is too short",
        })?;
        let prime_id = match (tail.len(), flags.is_prime()) {
            (0, false) => None,
            (TracesId::ENCODED_LEN, true) => TracesId::unmarshal(tail),
            _ => {
                return Err(CatalogError::CorruptRecord {
                    reason: "traces header prime id disagrees with its flags",
                });
            }
        };
        Ok(Self {
            traces_id,
            prime_id,
            flags,
        })
    }
}

/// What [`Catalog::try_add_graph`] did with a graph.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AddOutcome {
    /// The graph was already stored.
    Existing,
    /// The traces were known; the graph was stored under them.
    NewGraph {
        /// Id of the existing traces.
        traces_id: TracesId,
    },
    /// The traces were new; a header and the graph were stored.
    NewTraces {
        /// The header written for the traces.
        entry: TracesEntry,
    },
}

impl AddOutcome {
    /// Returns `true` unless the graph was already stored.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        !matches!(self, Self::Existing)
    }
}

/// Running totals over a batch of [`AddOutcome`]s.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AddSummary {
    existing: u64,
    new_graphs: u64,
    new_traces: u64,
    new_primes: u64,
}

impl AddSummary {
    /// Counts `outcome`.
    pub const fn record(&mut self, outcome: AddOutcome) {
        match outcome {
            AddOutcome::Existing => self.existing += 1,
            AddOutcome::NewGraph { .. } => self.new_graphs += 1,
            AddOutcome::NewTraces { entry } => {
                self.new_traces += 1;
                if entry.flags.is_prime() {
                    self.new_primes += 1;
                }
            }
        }
    }

    #[must_use]
    #[rustfmt::skip]
    pub const fn existing(&self) -> u64 { self.existing }

    /// Graphs stored under traces that were already known.
    #[must_use]
    #[rustfmt::skip]
    pub const fn new_graphs(&self) -> u64 { self.new_graphs }

    #[must_use]
    #[rustfmt::skip]
    pub const fn new_traces(&self) -> u64 { self.new_traces }

    #[must_use]
    #[rustfmt::skip]
    pub const fn new_primes(&self) -> u64 { self.new_primes }

    /// Total graphs stored by the batch.
    #[must_use]
    pub const fn added(&self) -> u64 {
        self.new_graphs + self.new_traces
    }
}

/// Configures [`Catalog::open`].
///
/// # Examples
/// ```
/// use fine2x3_core::{CatalogOpts, MemoryStore};
///
/// let catalog = CatalogOpts::new()
///     .with_trace_count(6)
///     .with_primes(true)
///     .open(MemoryStore::new())?;
/// assert_eq!(catalog.trace_count(), 6);
/// assert!(catalog.is_prime_catalog());
/// # Ok::<(), fine2x3_core::CatalogError>(())
/// ```
#[derive(Clone, Debug)]
pub struct CatalogOpts {
    trace_count: usize,
    need_primes: bool,
    header_cache: NonZeroUsize,
}

impl Default for CatalogOpts {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogOpts {
    /// Starts from the default trace count without prime classification.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            trace_count: DEFAULT_TRACE_COUNT,
            need_primes: false,
            header_cache: DEFAULT_HEADER_CACHE,
        }
    }

    /// Sets how many traces are kept per entry; zero selects
    /// [`DEFAULT_TRACE_COUNT`].
    ///
    /// The trace count also bounds the vertex count of stored graphs.
    /// Counts above [`MAX_TRACE_COUNT`] are rejected by [`Catalog::open`].
    #[must_use]
    pub const fn with_trace_count(mut self, trace_count: usize) -> Self {
        self.trace_count = if trace_count == 0 {
            DEFAULT_TRACE_COUNT
        } else {
            trace_count
        };
        self
    }

    /// Requests a prime catalog, which classifies new traces as prime or
    /// composite and can factor them.
    #[must_use]
    pub const fn with_primes(mut self, need_primes: bool) -> Self {
        self.need_primes = need_primes;
        self
    }

    /// Sets how many traces headers are remembered between lookups.
    #[must_use]
    pub const fn with_header_cache_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.header_cache = capacity;
        self
    }

    #[must_use]
    #[rustfmt::skip]
    pub const fn trace_count(&self) -> usize { self.trace_count }

    #[must_use]
    #[rustfmt::skip]
    pub const fn need_primes(&self) -> bool { self.need_primes }

    /// Opens a catalog over `store`.
    ///
    /// # Errors
    /// See [`Catalog::open`].
    pub fn open<S: CatalogStore>(self, store: S) -> Result<Catalog<S>, CatalogError> {
        Catalog::open(store, self)
    }
}

/// Bounds for [`Catalog::select`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Selector {
    min_vertices: usize,
    max_vertices: usize,
    primes_only: bool,
    unique_traces: bool,
}

impl Selector {
    /// Selects every graph with `min..=max` vertices.
    #[must_use]
    pub const fn vertices(min: usize, max: usize) -> Self {
        Self {
            min_vertices: min,
            max_vertices: max,
            primes_only: false,
            unique_traces: false,
        }
    }

    /// Skips graphs whose traces are not prime.
    #[must_use]
    pub const fn with_primes_only(mut self, primes_only: bool) -> Self {
        self.primes_only = primes_only;
        self
    }

    /// Keeps only the first stored graph for each trace vector.
    #[must_use]
    pub const fn with_unique_traces(mut self, unique_traces: bool) -> Self {
        self.unique_traces = unique_traces;
        self
    }
}

/// A factorization together with a graph realising it.
#[derive(Clone, Debug)]
pub struct Factorization {
    factors: FactorSet,
    graph: Construction,
}

impl Factorization {
    #[must_use]
    #[rustfmt::skip]
    pub const fn factors(&self) -> &FactorSet { &self.factors }

    /// Disjoint union of one stored graph per prime occurrence.
    #[must_use]
    #[rustfmt::skip]
    pub const fn graph(&self) -> &Construction { &self.graph }

    #[must_use]
    #[rustfmt::skip]
    pub fn into_graph(self) -> Construction { self.graph }
}

/// Keys and values derived from a graph before it is inserted.
struct PreparedGraph {
    vertex_count: usize,
    traces: Traces,
    header_key: Vec<u8>,
    graph_key: Vec<u8>,
    def: Vec<u8>,
}

enum Record<'a> {
    Header(TracesEntry),
    Graph(&'a [u8]),
}

struct CatalogInner {
    state: CatalogState,
    primes: Option<FactorCatalog>,
    headers: LruCache<Vec<u8>, TracesEntry>,
}

/// A graph catalog over a [`CatalogStore`].
///
/// Methods take `&self`; additions are serialised internally, so a catalog
/// can be shared between threads.
///
/// # Examples
/// ```
/// use fine2x3_core::{AddOutcome, CatalogOpts, Construction, GraphDef, MemoryStore};
///
/// let catalog = CatalogOpts::new().with_primes(true).open(MemoryStore::new())?;
/// let mut edge = Construction::from_def(&GraphDef::natural(2, &[(1, 2)]))?;
/// assert!(matches!(catalog.try_add_graph(&mut edge)?, AddOutcome::NewTraces { .. }));
/// assert_eq!(catalog.try_add_graph(&mut edge)?, AddOutcome::Existing);
/// assert_eq!(catalog.num_traces(2)?, 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Catalog<S> {
    store: S,
    trace_count: usize,
    inner: Mutex<CatalogInner>,
}

impl<S> std::fmt::Debug for Catalog<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("trace_count", &self.trace_count)
            .finish_non_exhaustive()
    }
}

impl<S: CatalogStore> Catalog<S> {
    /// Opens the catalog stored in `store`, initialising an empty store.
    ///
    /// # Errors
    /// Returns [`CatalogError::TraceCountTooHigh`] when either the requested
    /// or the stored trace count exceeds [`MAX_TRACE_COUNT`], and
    /// [`CatalogError::VersionMismatch`],
    /// [`CatalogError::TraceCountTooLow`], [`CatalogError::NotPrimeCatalog`],
    /// or [`CatalogError::CorruptState`] when the stored catalog cannot
    /// serve `opts`, and [`CatalogError::Store`] when the store fails.
    #[instrument(
        name = "catalog.open",
        skip(store, opts),
        fields(trace_count = opts.trace_count, need_primes = opts.need_primes),
    )]
    pub fn open(store: S, opts: CatalogOpts) -> Result<Self, CatalogError> {
        check_trace_count(opts.trace_count)?;
        let state = match store.get(&STATE_KEY)? {
            Some(stored) => CatalogState::decode(&stored.value)?,
            None => {
                let state = CatalogState::new(opts.trace_count, opts.need_primes);
                store.set(&STATE_KEY, StoredEntry::new(0, state.encode()?))?;
                info!(trace_count = state.trace_count, "initialised empty catalog");
                state
            }
        };
        check_trace_count(state.trace_count)?;
        if state.major_version != MAJOR_VERSION || state.minor_version != MINOR_VERSION {
            return Err(CatalogError::VersionMismatch {
                major: state.major_version,
                minor: state.minor_version,
            });
        }
        if opts.trace_count > state.trace_count {
            return Err(CatalogError::TraceCountTooLow {
                stored: state.trace_count,
                requested: opts.trace_count,
            });
        }
        if opts.need_primes && !state.is_prime_catalog {
            return Err(CatalogError::NotPrimeCatalog);
        }

        let trace_count = state.trace_count;
        let primes = state
            .is_prime_catalog
            .then(|| FactorCatalog::new(trace_count));
        Ok(Self {
            store,
            trace_count,
            inner: Mutex::new(CatalogInner {
                state,
                primes,
                headers: LruCache::new(opts.header_cache),
            }),
        })
    }

    /// Traces kept per entry; also the largest storable vertex count.
    #[must_use]
    #[rustfmt::skip]
    pub const fn trace_count(&self) -> usize { self.trace_count }

    #[must_use]
    #[rustfmt::skip]
    pub const fn store(&self) -> &S { &self.store }

    /// Returns `true` for a catalog that classifies primes.
    #[must_use]
    pub fn is_prime_catalog(&self) -> bool {
        self.lock()
            .map(|inner| inner.state.is_prime_catalog)
            .unwrap_or(false)
    }

    /// Number of distinct trace vectors stored for `nv` vertices.
    ///
    /// # Errors
    /// Returns [`CatalogError::Store`] when the catalog lock is poisoned.
    pub fn num_traces(&self, nv: usize) -> Result<u64, CatalogError> {
        Ok(self.lock()?.state.num_traces(nv))
    }

    /// Number of prime trace vectors stored for `nv` vertices.
    ///
    /// # Errors
    /// Returns [`CatalogError::Store`] when the catalog lock is poisoned.
    pub fn num_primes(&self, nv: usize) -> Result<u64, CatalogError> {
        Ok(self.lock()?.state.num_primes(nv))
    }

    /// Issues and persists the next traces id for `nv` vertices.
    ///
    /// # Errors
    /// Returns [`CatalogError::GraphTooLarge`] when `nv` is zero or exceeds
    /// the trace count, [`CatalogError::Graph`] when it exceeds
    /// [`MAX_VERTEX_COUNT`], and [`CatalogError::Store`] when the store fails.
    pub fn issue_next_id(&self, nv: usize) -> Result<TracesId, CatalogError> {
        self.check_vertex_count(nv)?;
        let mut inner = self.lock()?;
        let mut state = inner.state.clone();
        let id = state.issue_traces_id(nv)?;
        self.store.set(&STATE_KEY, StoredEntry::new(0, state.encode()?))?;
        inner.state = state;
        Ok(id)
    }

    /// Adds `graph` unless an identical graph is already stored.
    ///
    /// New traces are issued an id and, in a prime catalog, prime-tested
    /// against the primes of up to `nv - 1` vertices.
    ///
    /// # Errors
    /// Returns [`CatalogError::GraphTooLarge`] when the graph has more
    /// vertices than the trace count, [`CatalogError::Graph`] for an empty
    /// graph, and store or record errors from the backend.
    #[instrument(
        name = "catalog.try_add_graph",
        level = "debug",
        skip(self, graph),
        fields(vertex_count = graph.vertex_count()),
    )]
    pub fn try_add_graph(&self, graph: &mut Construction) -> Result<AddOutcome, CatalogError> {
        let prepared = self.prepare(graph)?;
        self.insert(prepared)
    }

    /// Adds every graph in `graphs`, computing traces and canonical keys in
    /// parallel and inserting in order.
    ///
    /// # Errors
    /// Returns the first error [`Catalog::try_add_graph`] would; graphs
    /// before it remain added.
    pub fn try_add_graphs(&self, graphs: &mut [Construction]) -> Result<AddSummary, CatalogError> {
        #[cfg(feature = "cpu")]
        let prepared: Vec<PreparedGraph> = graphs
            .par_iter_mut()
            .map(|graph| self.prepare(graph))
            .collect::<Result<_, _>>()?;
        #[cfg(not(feature = "cpu"))]
        let prepared: Vec<PreparedGraph> = graphs
            .iter_mut()
            .map(|graph| self.prepare(graph))
            .collect::<Result<_, _>>()?;

        let mut summary = AddSummary::default();
        for item in prepared {
            summary.record(self.insert(item)?);
        }
        Ok(summary)
    }

    /// Looks up the header for `traces`, which must hold exactly one trace
    /// per vertex.
    ///
    /// # Errors
    /// Returns store or record errors from the backend.
    pub fn lookup(&self, traces: &[i64]) -> Result<Option<TracesEntry>, CatalogError> {
        if traces.is_empty() || traces.len() > self.trace_count {
            return Ok(None);
        }
        let mut inner = self.lock()?;
        self.header_locked(&mut inner, &codec::encode_key(traces))
    }

    /// Returns every stored graph carrying `traces` (one trace per vertex).
    ///
    /// # Errors
    /// Returns store, record, or graph decoding errors.
    pub fn select_by_traces(&self, traces: &[i64]) -> Result<Vec<Construction>, CatalogError> {
        if traces.is_empty() || traces.len() > self.trace_count {
            return Ok(Vec::new());
        }
        let mut defs = Vec::new();
        self.scan(&codec::encode_key(traces), |record| {
            if let Record::Graph(def) = record {
                defs.push(def.to_vec());
            }
            ControlFlow::Continue(())
        })?;
        decode_graphs(&defs)
    }

    /// Returns stored graphs within `selector`'s bounds, ordered by vertex
    /// count then traces key.
    ///
    /// # Errors
    /// Returns store, record, or graph decoding errors.
    pub fn select(&self, selector: Selector) -> Result<Vec<Construction>, CatalogError> {
        let max = selector.max_vertices.min(self.trace_count);
        let mut defs = Vec::new();
        for nv in selector.min_vertices.max(1)..=max {
            let Ok(prefix) = u8::try_from(nv) else {
                break;
            };
            let mut wanted = false;
            let mut taken = false;
            self.scan(&[prefix], |record| {
                match record {
                    Record::Header(entry) => {
                        wanted = !selector.primes_only || entry.flags.is_prime();
                        taken = false;
                    }
                    Record::Graph(def) => {
                        if wanted && !(selector.unique_traces && taken) {
                            defs.push(def.to_vec());
                            taken = true;
                        }
                    }
                }
                ControlFlow::Continue(())
            })?;
        }
        decode_graphs(&defs)
    }

    /// Returns one stored graph per prime of `nv` vertices, by prime id.
    ///
    /// # Errors
    /// Returns store, record, or graph decoding errors.
    pub fn select_primes(&self, nv: usize) -> Result<Vec<(TracesId, Construction)>, CatalogError> {
        self.read_prime_defs(nv)?
            .into_iter()
            .map(|(id, def)| Ok((id, Construction::from_def(&GraphDef::decode(&def)?)?)))
            .collect()
    }

    /// Loads prime traces for every vertex count up to `nv` that is not yet
    /// cached.
    ///
    /// # Errors
    /// Returns [`CatalogError::NotPrimeCatalog`] for a catalog without
    /// primes, [`CatalogError::GraphTooLarge`] when `nv` exceeds the trace
    /// count, and store, record, or graph decoding errors.
    pub fn cache_primes_as_needed(&self, nv: usize) -> Result<(), CatalogError> {
        if nv > self.trace_count {
            return Err(CatalogError::GraphTooLarge {
                vertex_count: nv,
                trace_count: self.trace_count,
            });
        }
        let mut inner = self.lock()?;
        self.cache_primes_locked(&mut inner, nv)
    }

    /// Finds every factorization of `traces` (one trace per vertex) into
    /// stored primes, each paired with a graph realising it.
    ///
    /// # Errors
    /// Returns [`CatalogError::NotPrimeCatalog`] for a catalog without
    /// primes, [`CatalogError::GraphTooLarge`] when `traces` is longer than
    /// the trace count, and store, record, or graph decoding errors.
    #[instrument(
        name = "catalog.select_factorizations",
        skip(self, traces),
        fields(vertex_count = traces.len()),
    )]
    pub fn select_factorizations(&self, traces: &[i64]) -> Result<Vec<Factorization>, CatalogError> {
        let nv = traces.len();
        if nv == 0 {
            return Ok(Vec::new());
        }
        self.check_vertex_count(nv)?;
        let mut inner = self.lock()?;
        self.cache_primes_locked(&mut inner, nv)?;
        let primes = inner.primes.as_ref().ok_or(CatalogError::NotPrimeCatalog)?;
        primes
            .find_factorizations(traces)
            .into_iter()
            .map(|factors| {
                let graph = self.realise(primes, &factors)?;
                Ok(Factorization { factors, graph })
            })
            .collect()
    }

    fn lock(&self) -> Result<MutexGuard<'_, CatalogInner>, CatalogError> {
        self.inner
            .lock()
            .map_err(|_| CatalogError::Store(StoreError::Poisoned))
    }

    fn check_vertex_count(&self, nv: usize) -> Result<(), CatalogError> {
        if nv > MAX_VERTEX_COUNT {
            return Err(GraphError::TooManyVertices {
                got: nv,
                max: MAX_VERTEX_COUNT,
            }
            .into());
        }
        if nv == 0 || nv > self.trace_count {
            return Err(CatalogError::GraphTooLarge {
                vertex_count: nv,
                trace_count: self.trace_count,
            });
        }
        Ok(())
    }

    fn prepare(&self, graph: &mut Construction) -> Result<PreparedGraph, CatalogError> {
        let vertex_count = graph.vertex_count();
        if vertex_count == 0 {
            return Err(GraphError::EmptyGraph.into());
        }
        self.check_vertex_count(vertex_count)?;
        let traces = graph.traces(self.trace_count).clone();
        let header_key = codec::encode_key(&traces[..vertex_count]);
        let mut graph_key = header_key.clone();
        canonicalise(graph).append_to(&mut graph_key);
        Ok(PreparedGraph {
            vertex_count,
            traces,
            header_key,
            graph_key,
            def: graph.to_def().encode(),
        })
    }

    fn insert(&self, prepared: PreparedGraph) -> Result<AddOutcome, CatalogError> {
        let mut inner = self.lock()?;
        if let Some(entry) = self.header_locked(&mut inner, &prepared.header_key)? {
            if self.store.get(&prepared.graph_key)?.is_some() {
                return Ok(AddOutcome::Existing);
            }
            self.store
                .set(&prepared.graph_key, StoredEntry::new(0, prepared.def))?;
            return Ok(AddOutcome::NewGraph {
                traces_id: entry.traces_id,
            });
        }

        let PreparedGraph {
            vertex_count: nv,
            traces,
            header_key,
            graph_key,
            def,
        } = prepared;
        let mut state = inner.state.clone();
        let traces_id = state.issue_traces_id(nv)?;
        let mut flags = TracesFlags::empty();
        if traces.is_boson() {
            flags = flags.union(TracesFlags::BOSON);
        }
        let mut prime_id = None;
        if state.is_prime_catalog {
            self.cache_primes_locked(&mut inner, nv - 1)?;
            let is_prime = inner
                .primes
                .as_ref()
                .is_some_and(|primes| primes.is_prime(&traces[..nv]));
            if is_prime {
                flags = flags.union(TracesFlags::PRIME);
                prime_id = Some(state.issue_prime_id(nv)?);
            }
        }

        let entry = TracesEntry {
            traces_id,
            prime_id,
            flags,
        };
        let header = entry.to_stored();
        let state_bytes = state.encode()?;
        self.store.transact(&mut |txn| {
            txn.set(header_key.clone(), header.clone());
            txn.set(graph_key.clone(), StoredEntry::new(0, def.clone()));
            txn.set(STATE_KEY.to_vec(), StoredEntry::new(0, state_bytes.clone()));
        })?;

        inner.state = state;
        if let (Some(_), Some(primes)) = (prime_id, inner.primes.as_mut()) {
            if primes.populated_up_to() >= nv {
                primes.add_prime(nv, &traces);
            }
        }
        inner.headers.put(header_key, entry);
        record_new_traces(flags.is_prime());
        debug!(
            %traces_id,
            prime = flags.is_prime(),
            boson = flags.is_boson(),
            "recorded new traces"
        );
        Ok(AddOutcome::NewTraces { entry })
    }

    fn header_locked(
        &self,
        inner: &mut CatalogInner,
        key: &[u8],
    ) -> Result<Option<TracesEntry>, CatalogError> {
        if let Some(entry) = inner.headers.get(key) {
            return Ok(Some(*entry));
        }
        let Some(stored) = self.store.get(key)? else {
            return Ok(None);
        };
        let entry = TracesEntry::from_stored(&stored)?;
        inner.headers.put(key.to_vec(), entry);
        Ok(Some(entry))
    }

    fn cache_primes_locked(&self, inner: &mut CatalogInner, nv: usize) -> Result<(), CatalogError> {
        let primes = inner.primes.as_mut().ok_or(CatalogError::NotPrimeCatalog)?;
        for vi in primes.populated_up_to() + 1..=nv {
            let defs = self.read_prime_defs(vi)?;
            let mut traces = Vec::with_capacity(defs.len());
            for (idx, (id, def)) in defs.iter().enumerate() {
                if id.seq() != idx as u64 + 1 {
                    return Err(CatalogError::CorruptRecord {
                        reason: "prime ids are not contiguous",
                    });
                }
                let mut graph = Construction::from_def(&GraphDef::decode(def)?)?;
                traces.push(graph.traces(self.trace_count).clone());
            }
            primes.populate(vi, traces.iter().map(|values| values.as_slice()));
            debug!(vertex_count = vi, primes = traces.len(), "cached prime traces");
        }
        Ok(())
    }

    /// Reads the first graph stored under each prime header of `nv`
    /// vertices, sorted by prime id.
    fn read_prime_defs(&self, nv: usize) -> Result<Vec<(TracesId, Vec<u8>)>, CatalogError> {
        let Ok(prefix) = u8::try_from(nv) else {
            return Ok(Vec::new());
        };
        let mut pending = None;
        let mut found = Vec::new();
        self.scan(&[prefix], |record| {
            match record {
                Record::Header(entry) => pending = entry.prime_id,
                Record::Graph(def) => {
                    if let Some(id) = pending.take() {
                        found.push((id, def.to_vec()));
                    }
                }
            }
            ControlFlow::Continue(())
        })?;
        found.sort_by_key(|(id, _)| *id);
        Ok(found)
    }

    fn realise(&self, primes: &FactorCatalog, factors: &FactorSet) -> Result<Construction, CatalogError> {
        let mut def = GraphDef::default();
        for run in factors.runs() {
            let nv = usize::from(run.id.vertex_count());
            let traces = primes
                .prime_traces(run.id)
                .ok_or(CatalogError::CorruptRecord {
                    reason: "factor refers to an unknown prime",
                })?;
            let mut part = None;
            self.scan(&codec::encode_key(&traces[..nv]), |record| match record {
                Record::Header(_) => ControlFlow::Continue(()),
                Record::Graph(bytes) => {
                    part = Some(bytes.to_vec());
                    ControlFlow::Break(())
                }
            })?;
            let part = part.ok_or(CatalogError::CorruptRecord {
                reason: "prime has no stored graph",
            })?;
            let part = GraphDef::decode(&part)?;
            for _ in 0..run.count {
                def.concat(&part)?;
            }
        }
        Ok(Construction::from_def(&def)?)
    }

    /// Visits the records under `prefix`, classifying each key as a traces
    /// header or a graph.
    fn scan<F>(&self, prefix: &[u8], mut visit: F) -> Result<(), CatalogError>
    where
        F: FnMut(Record<'_>) -> ControlFlow<()>,
    {
        let mut failure = None;
        self.store.seek(prefix, &mut |key, stored| match classify(key, stored) {
            Ok(record) => visit(record),
            Err(err) => {
                failure = Some(err);
                ControlFlow::Break(())
            }
        })?;
        failure.map_or(Ok(()), Err)
    }
}

#[cfg(feature = "metrics")]
fn record_new_traces(prime: bool) {
    metrics::counter!("catalog_new_traces").increment(1);
    if prime {
        metrics::counter!("catalog_new_primes").increment(1);
    }
}

#[cfg(not(feature = "metrics"))]
const fn record_new_traces(_prime: bool) {}

fn classify<'a>(key: &[u8], stored: &'a StoredEntry) -> Result<Record<'a>, CatalogError> {
    let (_, header_len) = codec::decode_key(key).ok_or(CatalogError::CorruptRecord {
        reason: "key does not start with a traces header",
    })?;
    if header_len == key.len() {
        Ok(Record::Header(TracesEntry::from_stored(stored)?))
    } else {
        Ok(Record::Graph(&stored.value))
    }
}

fn check_trace_count(trace_count: usize) -> Result<(), CatalogError> {
    if trace_count > MAX_TRACE_COUNT {
        return Err(CatalogError::TraceCountTooHigh {
            requested: trace_count,
            max: MAX_TRACE_COUNT,
        });
    }
    Ok(())
}

fn decode_graphs(defs: &[Vec<u8>]) -> Result<Vec<Construction>, CatalogError> {
    defs.iter()
        .map(|def| Ok(Construction::from_def(&GraphDef::decode(def)?)?))
        .collect()
}

#[cfg(test)]
mod tests;
