//! Tests for canonicalisation and canonical encodings.

use std::collections::HashSet;

use proptest::prelude::*;
use rand::{SeedableRng, rngs::SmallRng, seq::SliceRandom};
use rstest::rstest;

use super::*;
use crate::{
    error::CanonError,
    graph::{EdgeDef, GraphDef, GrowOp, OpCode, Sign, VtxId},
    test_utils::{construction_from_edges, suite_proptest_config},
};

fn relabelled(graph: &Construction, perm: &[VtxId]) -> Construction {
    let def = graph.to_def();
    let edges = def
        .edges()
        .iter()
        .map(|edge| {
            let map = |v: VtxId| perm[usize::from(v) - 1];
            EdgeDef::new(map(edge.a), map(edge.b)).with_sign(edge.sign)
        })
        .collect();
    Construction::from_def(&GraphDef::new(def.vertex_count(), edges))
        .expect("relabelled graph should convert")
}

#[rstest]
fn lone_vertex_has_a_single_group() {
    let graph = construction_from_edges(1, &[]);
    let form = canonicalise(&graph);
    assert_eq!(form.encode(), [1, 0, 0, 0, 1, 1, 1, 1, 1]);
    assert_eq!(form.vertex_count(), 1);
}

#[rstest]
fn double_edge_renders_group_loops() {
    let graph = construction_from_edges(2, &[(1, 2), (1, 2)]);
    let form = canonicalise(&graph);
    assert_eq!(form.to_ascii(), "2oOO 2   ");
    assert_eq!(form.groups().len(), 1);
}

#[rstest]
fn path_ends_share_a_group() {
    let graph = construction_from_edges(3, &[(1, 2), (2, 3)]);
    let form = canonicalise(&graph);
    let groups = form.groups();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups.iter().map(|group| group.count).sum::<u8>(), 3);
    let ends = groups
        .iter()
        .find(|group| group.count == 2)
        .expect("path ends should merge");
    assert_eq!(ends.edges[0].0, EdgeFamily::LoopVtx);
    assert!(matches!(ends.edges[2].0, EdgeFamily::Group(_)));
}

#[rstest]
fn two_vertex_graphs_are_distinct() {
    let encodings: HashSet<Vec<u8>> = [
        &[(1, 2)][..],
        &[(1, 2), (1, 2)][..],
        &[(1, 2), (1, 2), (1, 2)][..],
        &[][..],
    ]
    .iter()
    .map(|edges| canonicalise(&construction_from_edges(2, edges)).encode())
    .collect();
    assert_eq!(encodings.len(), 4);
}

#[rstest]
fn relabelling_a_path_keeps_the_encoding() {
    let a = construction_from_edges(3, &[(1, 2), (2, 3)]);
    let b = construction_from_edges(3, &[(2, 1), (1, 3)]);
    assert_eq!(canonicalise(&a).encode(), canonicalise(&b).encode());
}

#[rstest]
fn signs_distinguish_graphs() {
    let natural = construction_from_edges(2, &[(1, 2)]);
    let def = GraphDef::new(2, vec![EdgeDef::new(1, 2).with_sign(Sign::Invert)]);
    let inverted = Construction::from_def(&def).expect("signed edge should convert");
    assert_ne!(canonicalise(&natural).encode(), canonicalise(&inverted).encode());
}

#[rstest]
fn graph_key_prefixes_traces_key() {
    let mut graph = construction_from_edges(2, &[(1, 2)]);
    let key = graph_key(&mut graph);
    let (traces, header_len) = codec::decode_key(&key).expect("key header should decode");
    assert_eq!(traces.as_slice(), &[4, 10]);
    assert_eq!(&key[header_len..], canonicalise(&graph).encode().as_slice());
}

#[rstest]
fn recanonicalise_merges_split_runs() {
    let bytes = [2, 0, 0, 1, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1];
    let merged = CanonicalForm::recanonicalise(&bytes).expect("encoding should decode");
    assert_eq!(merged, [1, 0, 0, 1, 1, 1, 1, 1, 2]);
}

#[rstest]
fn groups_sort_by_cycle_group_before_edges() {
    let natural = |family| (family, Sign::Natural);
    let bridged = CanonicalGroup {
        cycle_group: 1,
        edges: [
            natural(EdgeFamily::Group(2)),
            natural(EdgeFamily::LoopVtx),
            natural(EdgeFamily::LoopVtx),
        ],
        count: 1,
    };
    let looped = CanonicalGroup {
        cycle_group: 2,
        edges: [natural(EdgeFamily::LoopVtx); 3],
        count: 1,
    };
    let form = CanonicalForm::from_groups(vec![looped, bridged]);
    let order: Vec<u8> = form.groups().iter().map(|group| group.cycle_group).collect();
    assert_eq!(order, [1, 2]);
    assert_eq!(form.groups()[0].edges[2], natural(EdgeFamily::Group(2)));
}

#[rstest]
#[case::no_bytes(&[], CanonError::Empty)]
#[case::no_groups(&[0], CanonError::Empty)]
#[case::short(&[1, 0, 0], CanonError::LengthMismatch { expected: 9, got: 3 })]
#[case::zero_count(&[1, 0, 0, 0, 1, 1, 1, 1, 0], CanonError::ZeroMultiplicity { group: 0 })]
#[case::zero_cycle_group(
    &[1, 0, 0, 0, 0, 1, 1, 1, 1],
    CanonError::GroupOutOfRange { group: 0, id: 0, max: 0 }
)]
#[case::unknown_sign(&[1, 0, 0, 0, 1, 1, 9, 1, 1], CanonError::UnknownSign { group: 0, code: 9 })]
#[case::missing_group(
    &[1, 0, 0, 3, 1, 1, 1, 1, 1],
    CanonError::GroupOutOfRange { group: 0, id: 2, max: 1 }
)]
#[case::unknown_family(
    &[1, 0, 0, 200, 1, 1, 1, 1, 1],
    CanonError::UnknownFamily { group: 0, code: 200 }
)]
#[case::too_many_vertices(
    &[1, 0, 0, 0, 1, 1, 1, 1, 32],
    CanonError::TooManyVertices { got: 32, max: 31 }
)]
fn decode_rejects_malformed_encodings(#[case] bytes: &[u8], #[case] expected: CanonError) {
    let err = CanonicalForm::decode(bytes).expect_err("encoding should be rejected");
    assert_eq!(err, expected);
}

fn grow_strategy() -> impl Strategy<Value = Vec<GrowOp>> {
    let op = (0_u8..3, 1_u8..=7, 1_u8..=3).prop_map(|(code, vtx, slot)| {
        let code = match code {
            0 => OpCode::Sprout,
            1 => OpCode::DuplicateEdge,
            _ => OpCode::SplitEdge,
        };
        GrowOp::new(code, vtx, slot)
    });
    prop::collection::vec(op, 1..20)
}

proptest! {
    #![proptest_config(suite_proptest_config(64))]

    #[test]
    fn canonical_form_ignores_labels(ops in grow_strategy(), seed in any::<u64>()) {
        let mut graph = Construction::new();
        graph.grow(GrowOp::seed());
        for op in ops {
            graph.grow(op);
        }
        let count = VtxId::try_from(graph.vertex_count()).expect("vertex count fits a byte");
        let mut perm: Vec<VtxId> = (1..=count).collect();
        perm.shuffle(&mut SmallRng::seed_from_u64(seed));

        let original = canonicalise(&graph).encode();
        let shuffled = canonicalise(&relabelled(&graph, &perm)).encode();
        prop_assert_eq!(&original, &shuffled);
        prop_assert_eq!(CanonicalForm::recanonicalise(&original).expect("canonical bytes decode"), original);
    }
}
