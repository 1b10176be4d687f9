//! Shared test utilities for `fine2x3-core`.

use fine2x3_test_support::ci::property_test_profile::ProptestRunProfile;
use proptest::test_runner::Config as ProptestConfig;

use crate::graph::{Construction, GraphDef};

/// Builds a standard proptest configuration from the shared CI profile.
///
/// This keeps property suites aligned on the same `PROGTEST_CASES` and
/// `FINE2X3_PBT_FORK` interpretation.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

/// Builds a construction from `(a, b)` natural-sign edges over `vertex_count`
/// vertices, panicking on malformed input.
pub(crate) fn construction_from_edges(vertex_count: usize, edges: &[(u8, u8)]) -> Construction {
    let def = GraphDef::natural(vertex_count, edges);
    Construction::from_def(&def).expect("test graph should be well formed")
}
