//! Tests for opening, filling, and querying catalogs.

use std::sync::Arc;

use fine2x3_test_support::tracing::RecordingLayer;
use rstest::{fixture, rstest};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

use super::*;
use crate::{
    graph::{EdgeDef, Sign},
    test_utils::construction_from_edges,
    walker::{EnumOpts, enumerate},
};

fn lone_vertex() -> Construction {
    construction_from_edges(1, &[])
}

fn single_edge() -> Construction {
    construction_from_edges(2, &[(1, 2)])
}

fn inverted_edge() -> Construction {
    let def = GraphDef::new(2, vec![EdgeDef::new(1, 2).with_sign(Sign::Invert)]);
    Construction::from_def(&def).expect("signed edge should convert")
}

fn vertex_beside_edge() -> Construction {
    let mut def = GraphDef::natural(1, &[]);
    def.concat(&GraphDef::natural(2, &[(1, 2)]))
        .expect("three vertices fit");
    Construction::from_def(&def).expect("disjoint definition should convert")
}

fn prime_catalog<S: CatalogStore>(store: S) -> Catalog<S> {
    CatalogOpts::new()
        .with_trace_count(4)
        .with_primes(true)
        .open(store)
        .expect("catalog should open")
}

/// A prime catalog holding every graph of up to two vertices.
#[fixture]
fn filled() -> Catalog<MemoryStore> {
    let catalog = prime_catalog(MemoryStore::new());
    enumerate(EnumOpts::new(2))
        .expect("options should be valid")
        .add_to(&catalog)
        .expect("graphs should be added");
    catalog
}

fn write_state(store: &MemoryStore, state: &CatalogState) {
    let bytes = state.encode().expect("state should serialize");
    store
        .set(&STATE_KEY, StoredEntry::new(0, bytes))
        .expect("set should succeed");
}

#[rstest]
fn fresh_catalog_writes_its_state() {
    let store = MemoryStore::new();
    let catalog = CatalogOpts::new().open(&store).expect("catalog should open");
    assert_eq!(catalog.trace_count(), DEFAULT_TRACE_COUNT);
    assert!(!catalog.is_prime_catalog());
    assert_eq!(store.len().expect("len should succeed"), 1);
    assert_eq!(catalog.num_traces(3), Ok(0));
}

#[rstest]
fn zero_trace_count_selects_the_default() {
    let opts = CatalogOpts::new().with_trace_count(0);
    assert_eq!(opts.trace_count(), DEFAULT_TRACE_COUNT);
}

#[rstest]
fn enumerated_graphs_are_added_once() {
    let catalog = prime_catalog(MemoryStore::new());
    let summary = enumerate(EnumOpts::new(2))
        .expect("options should be valid")
        .add_to(&catalog)
        .expect("graphs should be added");
    assert_eq!(summary.new_traces(), 4);
    assert_eq!(summary.new_primes(), 4);
    assert_eq!(summary.new_graphs(), 0);
    assert_eq!(summary.added(), 4);
    assert_eq!(catalog.num_traces(1), Ok(1));
    assert_eq!(catalog.num_traces(2), Ok(3));
    assert_eq!(catalog.num_primes(2), Ok(3));

    let again = enumerate(EnumOpts::new(2))
        .expect("options should be valid")
        .add_to(&catalog)
        .expect("graphs should be re-added");
    assert_eq!(again.existing(), 4);
    assert_eq!(again.added(), 0);
}

#[rstest]
fn gauge_equivalent_graph_joins_existing_traces(filled: Catalog<MemoryStore>) {
    let natural = filled
        .lookup(&[4, 10])
        .expect("lookup should succeed")
        .expect("edge traces are stored");
    let outcome = filled
        .try_add_graph(&mut inverted_edge())
        .expect("graph should be added");
    assert_eq!(
        outcome,
        AddOutcome::NewGraph {
            traces_id: natural.traces_id()
        }
    );
    assert!(outcome.is_new());
    assert_eq!(filled.num_traces(2), Ok(3));
    assert_eq!(
        filled
            .select_by_traces(&[4, 10])
            .expect("select should succeed")
            .len(),
        2
    );
}

#[rstest]
fn triple_edge_is_a_prime_boson(filled: Catalog<MemoryStore>) {
    let entry = filled
        .lookup(&[0, 18])
        .expect("lookup should succeed")
        .expect("triple edge traces are stored");
    assert!(entry.flags().is_boson());
    assert!(entry.flags().is_prime());
    assert_eq!(entry.prime_id(), Some(TracesId::new(2, 3)));

    let edge = filled
        .lookup(&[4, 10])
        .expect("lookup should succeed")
        .expect("edge traces are stored");
    assert!(!edge.flags().is_boson());
    assert_eq!(filled.lookup(&[5, 11]), Ok(None));
}

#[rstest]
fn composite_graph_is_factored_into_stored_primes() {
    let catalog = prime_catalog(MemoryStore::new());
    for mut graph in [lone_vertex(), single_edge()] {
        catalog.try_add_graph(&mut graph).expect("prime should be added");
    }
    let outcome = catalog
        .try_add_graph(&mut vertex_beside_edge())
        .expect("composite should be added");
    let AddOutcome::NewTraces { entry } = outcome else {
        panic!("composite traces should be new, got {outcome:?}");
    };
    assert!(!entry.flags().is_prime());
    assert_eq!(entry.prime_id(), None);
    assert_eq!(catalog.num_primes(3), Ok(0));

    let found = catalog
        .select_factorizations(&[7, 19, 55])
        .expect("factorization should succeed");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].factors().to_string(), "1-1 2-1");
    let mut graph = found[0].clone().into_graph();
    assert_eq!(graph.vertex_count(), 3);
    assert_eq!(graph.traces(3).as_slice(), &[7, 19, 55]);
}

#[rstest]
fn reopened_catalog_keeps_counters_and_primes() {
    let store = Arc::new(MemoryStore::new());
    {
        let catalog = prime_catalog(Arc::clone(&store));
        enumerate(EnumOpts::new(2))
            .expect("options should be valid")
            .add_to(&catalog)
            .expect("graphs should be added");
    }
    let catalog = CatalogOpts::new()
        .with_trace_count(3)
        .with_primes(true)
        .open(Arc::clone(&store))
        .expect("catalog should reopen");
    assert_eq!(catalog.trace_count(), 4);
    assert_eq!(catalog.num_primes(2), Ok(3));

    let primes = catalog.select_primes(2).expect("primes should load");
    let ids: Vec<TracesId> = primes.iter().map(|(id, _)| *id).collect();
    assert_eq!(
        ids,
        [TracesId::new(2, 1), TracesId::new(2, 2), TracesId::new(2, 3)]
    );

    let found = catalog
        .select_factorizations(&[7, 19, 55])
        .expect("factorization should succeed");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].factors().to_string(), "1-1 2-1");
}

#[rstest]
fn open_rejects_other_versions() {
    let store = MemoryStore::new();
    let mut state = CatalogState::new(4, false);
    state.major_version = 2021;
    write_state(&store, &state);
    let err = CatalogOpts::new()
        .open(&store)
        .expect_err("old catalog should be rejected");
    assert_eq!(
        err,
        CatalogError::VersionMismatch {
            major: 2021,
            minor: 1
        }
    );
    assert_eq!(err.code().as_str(), "CATALOG_VERSION_MISMATCH");
}

#[rstest]
fn open_rejects_a_larger_trace_count() {
    let store = MemoryStore::new();
    CatalogOpts::new()
        .with_trace_count(4)
        .open(&store)
        .expect("catalog should open");
    let err = CatalogOpts::new()
        .with_trace_count(8)
        .open(&store)
        .expect_err("larger trace count should be rejected");
    assert_eq!(
        err,
        CatalogError::TraceCountTooLow {
            stored: 4,
            requested: 8
        }
    );
}

#[rstest]
fn open_rejects_trace_counts_beyond_a_key_byte() {
    let store = MemoryStore::new();
    let err = CatalogOpts::new()
        .with_trace_count(300)
        .open(&store)
        .expect_err("oversized trace count should be rejected");
    assert_eq!(
        err,
        CatalogError::TraceCountTooHigh {
            requested: 300,
            max: MAX_TRACE_COUNT
        }
    );
    assert_eq!(store.get(&STATE_KEY), Ok(None));

    write_state(&store, &CatalogState::new(300, false));
    let err = CatalogOpts::new()
        .open(&store)
        .expect_err("oversized stored state should be rejected");
    assert_eq!(err.code().as_str(), "CATALOG_TRACE_COUNT_TOO_HIGH");
}

#[rstest]
#[case::beyond_the_trace_count(256, "CATALOG_GRAPH_TOO_LARGE")]
#[case::beyond_the_vertex_limit(MAX_VERTEX_COUNT + 1, "CATALOG_GRAPH")]
fn issued_ids_stay_within_the_vertex_limit(#[case] nv: usize, #[case] code: &str) {
    let catalog = CatalogOpts::new()
        .with_trace_count(MAX_TRACE_COUNT)
        .open(MemoryStore::new())
        .expect("largest trace count should open");
    let err = catalog
        .issue_next_id(nv)
        .expect_err("oversized vertex count should be rejected");
    assert_eq!(err.code().as_str(), code);
    assert_eq!(catalog.num_traces(nv), Ok(0));
    assert_eq!(
        catalog.issue_next_id(MAX_VERTEX_COUNT),
        Ok(TracesId::new(31, 1))
    );
}

#[rstest]
fn open_rejects_primes_from_a_plain_catalog() {
    let store = MemoryStore::new();
    CatalogOpts::new()
        .with_trace_count(4)
        .open(&store)
        .expect("catalog should open");
    let err = CatalogOpts::new()
        .with_trace_count(4)
        .with_primes(true)
        .open(&store)
        .expect_err("plain catalog cannot serve primes");
    assert_eq!(err, CatalogError::NotPrimeCatalog);
}

#[rstest]
fn open_rejects_a_corrupt_state() {
    let store = MemoryStore::new();
    store
        .set(&STATE_KEY, StoredEntry::new(0, b"{".to_vec()))
        .expect("set should succeed");
    let err = CatalogOpts::new()
        .open(&store)
        .expect_err("corrupt state should be rejected");
    assert!(matches!(err, CatalogError::CorruptState { .. }));
}

#[rstest]
fn graphs_beyond_the_trace_count_are_rejected() {
    let catalog = CatalogOpts::new()
        .with_trace_count(2)
        .open(MemoryStore::new())
        .expect("catalog should open");
    let mut path = construction_from_edges(3, &[(1, 2), (2, 3)]);
    assert_eq!(
        catalog.try_add_graph(&mut path),
        Err(CatalogError::GraphTooLarge {
            vertex_count: 3,
            trace_count: 2
        })
    );
    assert!(catalog.issue_next_id(0).is_err());
}

#[rstest]
fn plain_catalog_cannot_factor() {
    let catalog = CatalogOpts::new()
        .with_trace_count(4)
        .open(MemoryStore::new())
        .expect("catalog should open");
    assert_eq!(
        catalog.cache_primes_as_needed(2),
        Err(CatalogError::NotPrimeCatalog)
    );
    assert!(matches!(
        catalog.select_factorizations(&[4, 10]),
        Err(CatalogError::NotPrimeCatalog)
    ));
    assert!(matches!(
        catalog.cache_primes_as_needed(5),
        Err(CatalogError::GraphTooLarge { .. })
    ));
}

#[rstest]
#[case::everything(Selector::vertices(1, 2), 5)]
#[case::unique_traces(Selector::vertices(1, 2).with_unique_traces(true), 4)]
#[case::pairs_only(Selector::vertices(2, 2), 4)]
#[case::prime_pairs(Selector::vertices(2, 2).with_primes_only(true).with_unique_traces(true), 3)]
#[case::beyond_stored(Selector::vertices(3, 9), 0)]
fn select_honours_bounds(
    filled: Catalog<MemoryStore>,
    #[case] selector: Selector,
    #[case] expected: usize,
) {
    filled
        .try_add_graph(&mut inverted_edge())
        .expect("graph should be added");
    let graphs = filled.select(selector).expect("select should succeed");
    assert_eq!(graphs.len(), expected);
    assert!(
        graphs
            .windows(2)
            .all(|pair| pair[0].vertex_count() <= pair[1].vertex_count())
    );
}

#[rstest]
fn batch_add_summarises_outcomes() {
    let catalog = CatalogOpts::new()
        .with_trace_count(4)
        .open(MemoryStore::new())
        .expect("catalog should open");
    let mut graphs = vec![lone_vertex(), single_edge(), lone_vertex(), inverted_edge()];
    let summary = catalog
        .try_add_graphs(&mut graphs)
        .expect("batch should be added");
    assert_eq!(summary.new_traces(), 2);
    assert_eq!(summary.new_graphs(), 1);
    assert_eq!(summary.existing(), 1);
    assert_eq!(summary.new_primes(), 0);
}

#[rstest]
fn issued_ids_are_persisted() {
    let store = MemoryStore::new();
    let catalog = CatalogOpts::new()
        .with_trace_count(4)
        .open(&store)
        .expect("catalog should open");
    assert_eq!(catalog.issue_next_id(2), Ok(TracesId::new(2, 1)));
    assert_eq!(catalog.issue_next_id(2), Ok(TracesId::new(2, 2)));
    drop(catalog);

    let reopened = CatalogOpts::new()
        .with_trace_count(4)
        .open(&store)
        .expect("catalog should reopen");
    assert_eq!(reopened.num_traces(2), Ok(2));
}

#[rstest]
fn header_with_inconsistent_flags_is_corrupt() {
    let store = MemoryStore::new();
    let catalog = CatalogOpts::new()
        .with_trace_count(4)
        .open(&store)
        .expect("catalog should open");
    let bogus = StoredEntry::new(
        TracesFlags::PRIME.bits(),
        TracesId::new(2, 1).marshal().to_vec(),
    );
    store
        .set(&codec::encode_key(&[4, 10]), bogus)
        .expect("set should succeed");
    assert!(matches!(
        catalog.lookup(&[4, 10]),
        Err(CatalogError::CorruptRecord { .. })
    ));
}

#[rstest]
fn open_logs_initialisation() {
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    tracing::subscriber::with_default(subscriber, || {
        CatalogOpts::new()
            .with_trace_count(5)
            .open(MemoryStore::new())
            .expect("catalog should open");
    });

    let spans = layer.spans();
    let span = spans
        .iter()
        .find(|span| span.name == "catalog.open")
        .expect("open span must exist");
    assert_eq!(span.fields.get("trace_count"), Some(&"5".to_owned()));
    assert!(layer.events().iter().any(|event| {
        event.level == Level::INFO
            && event
                .fields
                .get("message")
                .is_some_and(|value| value == "initialised empty catalog")
    }));
}
