//! Factoring catalogued traces into primes.

mod common;

use common::{filled_catalog, graph};
use fine2x3_core::{AddOutcome, Construction, GraphDef};
use rstest::rstest;

#[rstest]
fn every_stored_prime_factors_only_into_itself() {
    let catalog = filled_catalog(3, 4);
    for nv in 1..=3 {
        for (id, mut prime) in catalog.select_primes(nv).expect("primes should load") {
            let traces = prime.traces(nv)[..nv].to_vec();
            let found = catalog
                .select_factorizations(&traces)
                .expect("factorization should succeed");
            assert_eq!(found.len(), 1, "prime {id} should have one factorization");
            assert_eq!(found[0].factors().factor_count(), 1);
            assert_eq!(found[0].factors().runs()[0].id, id);
        }
    }
}

#[rstest]
fn two_lone_vertices_factor_as_a_square() {
    let catalog = filled_catalog(2, 4);
    let mut pair = GraphDef::natural(1, &[]);
    pair.concat(&GraphDef::natural(1, &[]))
        .expect("two vertices fit");
    let mut pair = Construction::from_def(&pair).expect("pair should convert");
    let outcome = catalog
        .try_add_graph(&mut pair)
        .expect("composite should be added");
    let AddOutcome::NewTraces { entry } = outcome else {
        panic!("two lone vertices should carry new traces, got {outcome:?}");
    };
    assert!(!entry.flags().is_prime());

    let found = catalog
        .select_factorizations(&[6, 18])
        .expect("factorization should succeed");
    let rendered: Vec<String> = found.iter().map(|f| f.factors().to_string()).collect();
    assert_eq!(rendered, ["1-1^2"]);
}

#[rstest]
fn realised_factorizations_carry_the_target_traces() {
    let catalog = filled_catalog(2, 5);
    let mut target = graph(2, &[(1, 2), (1, 2)]);
    let mut def = target.to_def();
    def.concat(&GraphDef::natural(1, &[])).expect("three vertices fit");
    def.concat(&GraphDef::natural(2, &[(1, 2)])).expect("five vertices fit");
    let mut composite = Construction::from_def(&def).expect("composite should convert");
    let traces = composite.traces(5).to_vec();

    let found = catalog
        .select_factorizations(&traces)
        .expect("factorization should succeed");
    assert!(!found.is_empty());
    for factorization in found {
        assert_eq!(factorization.factors().vertex_count(), 5);
        let mut realised = factorization.into_graph();
        assert_eq!(realised.vertex_count(), 5);
        assert_eq!(realised.traces(5).as_slice(), traces.as_slice());
    }
    assert_eq!(target.traces(2).as_slice(), &[2, 10]);
}
