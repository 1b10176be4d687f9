//! Prime trace tables and the factorization search.
//!
//! Traces are additive over disjoint components, so a composite graph's
//! trace vector is the sum of its components'. The search looks for every
//! multiset of known primes, ordered by non-decreasing vertex count, whose
//! traces sum exactly to a target; sizes of the chosen primes always add up
//! to the target's length.

mod search;
mod set;
mod table;

pub use search::{FactorMessage, Factorizations};
pub use set::{FactorRun, FactorSet};
pub use table::FactorCatalog;
