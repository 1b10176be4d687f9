//! Canonical multisets of prime factors.

use std::{cmp::Ordering, fmt};

use crate::traces::TracesId;

/// One prime and how many times it appears in a factorization.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FactorRun {
    /// Prime identifier.
    pub id: TracesId,
    /// Multiplicity; always at least one.
    pub count: u32,
}

/// A factorization as `{id, count}` runs sorted by ascending id.
///
/// Sets order lexicographically by `(id, count)`; when one set is a prefix of
/// another the shorter one sorts greater.
///
/// # Examples
/// ```
/// use fine2x3_core::{FactorSet, TracesId};
///
/// let mut set = FactorSet::new();
/// set.insert(TracesId::new(2, 1));
/// set.insert(TracesId::new(1, 3));
/// set.insert(TracesId::new(2, 1));
/// assert_eq!(set.to_string(), "1-3 2-1^2");
/// assert_eq!(set.vertex_count(), 5);
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct FactorSet(Vec<FactorRun>);

impl FactorSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds one occurrence of `id`, keeping the runs sorted.
    pub fn insert(&mut self, id: TracesId) {
        match self.0.binary_search_by(|run| run.id.cmp(&id)) {
            Ok(idx) => self.0[idx].count += 1,
            Err(idx) => self.0.insert(idx, FactorRun { id, count: 1 }),
        }
    }

    /// Removes every run.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    #[rustfmt::skip]
    pub fn runs(&self) -> &[FactorRun] { &self.0 }

    /// Number of distinct primes.
    #[must_use]
    #[rustfmt::skip]
    pub fn len(&self) -> usize { self.0.len() }

    #[must_use]
    #[rustfmt::skip]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Total number of prime occurrences.
    #[must_use]
    pub fn factor_count(&self) -> u32 {
        self.0.iter().map(|run| run.count).sum()
    }

    /// Sum of the primes' vertex counts, i.e. the size of the composite.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.0
            .iter()
            .map(|run| usize::from(run.id.vertex_count()) * run.count as usize)
            .sum()
    }
}

impl Ord for FactorSet {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().zip(&other.0) {
            match (a.id, a.count).cmp(&(b.id, b.count)) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        other.0.len().cmp(&self.0.len())
    }
}

impl PartialOrd for FactorSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FactorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, run) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", run.id)?;
            if run.count > 1 {
                write!(f, "^{}", run.count)?;
            }
        }
        Ok(())
    }
}
