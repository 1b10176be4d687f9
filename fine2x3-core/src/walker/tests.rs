//! Tests for the enumeration walker and its stream stages.

use std::{collections::HashSet, ops::ControlFlow, sync::Arc};

use fine2x3_test_support::tracing::RecordingLayer;
use rstest::rstest;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

use super::*;
use crate::{
    canon::canonicalise,
    graph::{Construction, Sign},
    test_utils::construction_from_edges,
};

fn collect(opts: EnumOpts) -> (Vec<Construction>, WalkSummary) {
    let walker = opts.build().expect("options should be valid");
    let mut graphs = Vec::new();
    let summary = walker.run(|graph| {
        graphs.push(graph.into_inner());
        ControlFlow::Continue(())
    });
    (graphs, summary)
}

fn encodings(graphs: &[Construction]) -> Vec<Vec<u8>> {
    graphs.iter().map(|graph| canonicalise(graph).encode()).collect()
}

#[rstest]
fn cap_one_emits_a_lone_vertex() {
    let (mut graphs, summary) = collect(EnumOpts::new(1));
    assert_eq!(graphs.len(), 1);
    assert!(summary.completed());
    assert_eq!(summary.emitted(), 1);
    let graph = graphs.pop().expect("one graph");
    assert_eq!(graph.vertex_count(), 1);
    assert_eq!(graph.particle_count(), 1);
}

#[rstest]
#[case::minimal(WalkerVariant::Minimal)]
#[case::with_splits(WalkerVariant::WithSplits)]
fn cap_two_adds_three_edge_multiplicities(#[case] variant: WalkerVariant) {
    let (mut graphs, _) = collect(EnumOpts::new(2).with_variant(variant));
    let counts: Vec<usize> = graphs.iter().map(Construction::vertex_count).collect();
    assert_eq!(counts, [1, 2, 2, 2]);

    let distinct: HashSet<Vec<u8>> = encodings(&graphs).into_iter().collect();
    assert_eq!(distinct.len(), 4);

    let traces: Vec<Vec<i64>> = graphs
        .iter_mut()
        .skip(1)
        .map(|graph| graph.traces(0).to_vec())
        .collect();
    assert_eq!(traces, [vec![4, 10], vec![2, 10], vec![0, 18]]);
}

#[rstest]
#[case::minimal(WalkerVariant::Minimal)]
#[case::with_splits(WalkerVariant::WithSplits)]
fn emission_never_shrinks_vertex_count(#[case] variant: WalkerVariant) {
    let (graphs, summary) = collect(EnumOpts::new(5).with_variant(variant));
    assert!(summary.completed());
    assert!(
        graphs
            .windows(2)
            .all(|pair| pair[0].vertex_count() <= pair[1].vertex_count())
    );
    assert!(graphs.iter().all(|graph| graph.vertex_count() <= 5));
    assert!(graphs.iter().all(|graph| graph.validate().is_ok()));
}

#[rstest]
fn repeated_runs_agree() {
    let (first, a) = collect(EnumOpts::new(4));
    let (second, b) = collect(EnumOpts::new(4));
    assert_eq!(encodings(&first), encodings(&second));
    assert_eq!(a, b);
}

#[rstest]
fn fork_ids_are_unique_and_follow_parents() {
    let (graphs, summary) = collect(EnumOpts::new(4));
    let ids: HashSet<u64> = graphs.iter().map(Construction::fork_id).collect();
    assert_eq!(ids.len(), graphs.len());
    assert!(graphs.iter().all(|graph| graph.parent_id() < graph.fork_id()));
    assert_eq!(summary.forks_accepted(), summary.emitted());
}

#[rstest]
#[case::zero(0)]
#[case::above_limit(MAX_VERTEX_COUNT + 1)]
fn build_rejects_vertex_caps_out_of_range(#[case] vertex_max: usize) {
    let err = EnumOpts::new(vertex_max)
        .build()
        .expect_err("vertex cap should be rejected");
    assert!(matches!(
        err,
        EnumError::InvalidVertexMax { got, max } if got == vertex_max && max == MAX_VERTEX_COUNT
    ));
    assert_eq!(err.code().as_str(), "ENUM_INVALID_VERTEX_MAX");
}

#[rstest]
fn cancelled_token_stops_before_emitting() {
    let token = CancelToken::new();
    token.cancel();
    let (graphs, summary) = collect(EnumOpts::new(4).with_cancel_token(token));
    assert!(graphs.is_empty());
    assert_eq!(summary.emitted(), 0);
    assert!(!summary.completed());
}

#[rstest]
fn cancelling_mid_run_stops_at_the_next_dequeue() {
    let token = CancelToken::new();
    let walker = EnumOpts::new(4)
        .with_cancel_token(token.clone())
        .build()
        .expect("options should be valid");
    let mut seen = 0;
    let summary = walker.run(|_graph| {
        seen += 1;
        if seen == 3 {
            token.cancel();
        }
        ControlFlow::Continue(())
    });
    assert_eq!(seen, 3);
    assert_eq!(summary.emitted(), 3);
    assert!(!summary.completed());
}

#[rstest]
fn sink_break_ends_the_run() {
    let walker = EnumOpts::new(4).build().expect("options should be valid");
    let summary = walker.run(|_graph| ControlFlow::Break(()));
    assert_eq!(summary.emitted(), 1);
    assert!(!summary.completed());
}

#[rstest]
fn emitted_graphs_return_to_a_private_pool() {
    let pool = Arc::new(ConstructionPool::new());
    let walker = EnumOpts::new(3)
        .with_pool(Arc::clone(&pool))
        .build()
        .expect("options should be valid");
    let summary = walker.run(|_graph| ControlFlow::Continue(()));
    assert!(summary.completed());
    assert!(pool.idle() > 0);
}

#[rstest]
fn stream_yields_the_same_graphs_as_a_direct_run() {
    let (direct, _) = collect(EnumOpts::new(3));
    let streamed: Vec<Construction> = enumerate(EnumOpts::new(3))
        .expect("stream should start")
        .map(Pooled::into_inner)
        .collect();
    assert_eq!(encodings(&direct), encodings(&streamed));
}

#[rstest]
fn dropping_the_consumer_ends_the_producer() {
    let mut stream = enumerate(EnumOpts::new(5)).expect("stream should start");
    assert_eq!(stream.by_ref().take(3).count(), 3);
    let summary = stream.join().expect("walker should not panic");
    assert!(!summary.completed());
}

#[rstest]
fn drop_duplicates_keeps_first_occurrences() {
    let (graphs, _) = collect(EnumOpts::new(3));
    let total = graphs.len();
    let doubled = graphs.iter().cloned().chain(graphs.iter().cloned());
    let kept: Vec<Construction> = DropDuplicates::new()
        .filter(doubled.map(Box::new))
        .map(|graph| *graph)
        .collect();
    assert_eq!(kept.len(), total);
    assert_eq!(encodings(&kept), encodings(&graphs));
}

#[rstest]
fn run_records_walker_span_and_summary_event() {
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let walker = EnumOpts::new(3)
        .with_variant(WalkerVariant::Minimal)
        .build()
        .expect("options should be valid");

    let summary = tracing::subscriber::with_default(subscriber, || {
        walker.run(|_graph| ControlFlow::Continue(()))
    });

    let spans = layer.spans();
    let run_span = spans
        .iter()
        .find(|span| span.name == "walker.run")
        .expect("walker.run span must exist");
    assert_eq!(run_span.fields.get("vertex_max"), Some(&"3".to_owned()));
    assert_eq!(run_span.fields.get("variant"), Some(&"Minimal".to_owned()));

    let events = layer.events();
    let finished = events
        .iter()
        .find(|event| {
            event.level == Level::INFO
                && event
                    .fields
                    .get("message")
                    .is_some_and(|value| value == "enumeration finished")
        })
        .expect("completion event must exist");
    assert_eq!(
        finished.fields.get("emitted"),
        Some(&summary.emitted().to_string())
    );
    assert_eq!(finished.fields.get("completed"), Some(&"true".to_owned()));
}

#[rstest]
#[case::lone_vertex(1, &[][..], 4)]
#[case::single_edge(2, &[(1, 2)][..], 18)]
#[case::triple_edge(2, &[(1, 2), (1, 2), (1, 2)][..], 4)]
#[case::path(3, &[(1, 2), (2, 3)][..], 3 * 2 * 2 * 2 * 3)]
fn edge_signs_vary_per_group(
    #[case] vertex_count: usize,
    #[case] edges: &[(u8, u8)],
    #[case] expected: u64,
) {
    let graph = construction_from_edges(vertex_count, edges);
    let signs = all_edge_signs(&graph);
    assert_eq!(signs.permutation_count(), expected);
    let graphs: Vec<Construction> = signs.collect();
    assert_eq!(graphs.len() as u64, expected);

    let mut distinct = HashSet::new();
    for permuted in &graphs {
        permuted.validate().expect("signs should stay paired");
        distinct.insert(permuted.to_def());
    }
    assert_eq!(distinct.len(), graphs.len());
}

#[rstest]
fn edge_signs_run_from_natural_to_inverted() {
    let graph = construction_from_edges(3, &[(1, 2), (1, 2), (2, 3)]);
    let graphs: Vec<Construction> = all_edge_signs(&graph).collect();
    let signs = |permuted: &Construction| -> Vec<Sign> {
        permuted
            .vertices()
            .iter()
            .flat_map(|vertex| vertex.edges.iter().map(|slot| slot.sign))
            .collect()
    };
    let first = graphs.first().expect("at least one assignment");
    let last = graphs.last().expect("at least one assignment");
    assert!(signs(first).iter().all(|&sign| sign == Sign::Natural));
    assert!(signs(last).iter().all(|&sign| sign == Sign::Invert));
    assert!(
        last.ops()[graph.ops().len()..]
            .iter()
            .all(|op| op.op_code == OpCode::NegateEdge)
    );
}

#[rstest]
fn permuted_signs_keep_traces_consistent() {
    let (graphs, _) = collect(EnumOpts::new(3));
    for mut permuted in permute_edge_signs(graphs.iter()) {
        let mut rebuilt =
            Construction::from_def(&permuted.to_def()).expect("definition should convert");
        let ops = permuted.ops_string();
        assert_eq!(
            permuted.traces(4).as_slice(),
            rebuilt.traces(4).as_slice(),
            "{}",
            ops
        );
    }
}

#[rstest]
fn sign_stage_feeds_duplicate_filter() {
    let (graphs, _) = collect(EnumOpts::new(2));
    let total: u64 = graphs
        .iter()
        .map(|graph| all_edge_signs(graph).permutation_count())
        .sum();
    let kept = DropDuplicates::new()
        .filter(permute_edge_signs(graphs.iter()).map(Box::new))
        .count();
    assert_eq!(permute_edge_signs(graphs.iter()).count() as u64, total);
    assert!(kept > graphs.len());
    assert!((kept as u64) <= total);
}

#[rstest]
#[case::singles(1, 1)]
#[case::pairs(2, 2)]
#[case::up_to_triples(1, 3)]
fn selector_keeps_the_vertex_range(#[case] min: usize, #[case] max: usize) {
    let (mut graphs, _) = collect(EnumOpts::new(3));
    let expected = graphs
        .iter()
        .filter(|graph| (min..=max).contains(&graph.vertex_count()))
        .count();
    let kept = StreamSelector::vertices(min, max)
        .select(graphs.iter_mut())
        .count();
    assert_eq!(kept, expected);
}

#[rstest]
fn selector_matches_leading_traces() {
    let (mut graphs, _) = collect(EnumOpts::new(3));
    let wanted = graphs
        .iter_mut()
        .find(|graph| graph.vertex_count() == 3)
        .map(|graph| graph.traces(3).to_vec())
        .expect("a three-vertex graph");
    let kept: Vec<String> = StreamSelector::vertices(1, 3)
        .with_traces(wanted.clone())
        .select(graphs.iter_mut())
        .map(|graph| graph.ops_string())
        .collect();
    assert!(!kept.is_empty());
    for mut graph in graphs {
        let matches = graph.traces(3).as_slice() == wanted.as_slice();
        assert_eq!(kept.contains(&graph.ops_string()), matches);
    }
}
