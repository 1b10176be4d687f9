//! Benchmark support crate for fine2x3.
//!
//! Provides seeded random graphs and parameter types used by the Criterion
//! benchmarks for trace computation, enumeration, and factorization.

pub mod error;
pub mod params;
pub mod source;
