//! Per-vertex-count tables of prime trace vectors.

use crate::traces::{Traces, TracesId};

/// Primes sharing one vertex count, stored back to back with a fixed stride.
#[derive(Clone, Debug, Default)]
pub(super) struct FactorTable {
    values: Vec<i64>,
    len: usize,
}

impl FactorTable {
    pub(super) fn push(&mut self, traces: &[i64]) {
        self.values.extend_from_slice(traces);
        self.len += 1;
    }

    #[rustfmt::skip]
    pub(super) const fn len(&self) -> usize { self.len }

    pub(super) fn prime(&self, idx: usize, stride: usize) -> &[i64] {
        &self.values[idx * stride..(idx + 1) * stride]
    }
}

/// Known prime trace vectors, indexed by vertex count.
///
/// Tables are populated in ascending vertex-count order and only ever grow.
/// The `k`-th prime added for `nv` vertices is named `TracesId::new(nv, k)`
/// with `k` counting from one.
///
/// # Examples
/// ```
/// use fine2x3_core::{FactorCatalog, TracesId};
///
/// let mut primes = FactorCatalog::new(3);
/// primes.populate(1, [&[3_i64, 9, 27][..]]);
/// assert_eq!(primes.populated_up_to(), 1);
/// assert_eq!(primes.prime_traces(TracesId::new(1, 1)), Some(&[3_i64, 9, 27][..]));
/// ```
#[derive(Clone, Debug)]
pub struct FactorCatalog {
    stride: usize,
    tables: Vec<FactorTable>,
    populated: usize,
}

impl FactorCatalog {
    /// Creates an empty catalog holding primes of up to `stride` vertices,
    /// each stored with `stride` traces.
    #[must_use]
    pub fn new(stride: usize) -> Self {
        Self {
            stride,
            tables: vec![FactorTable::default(); stride + 1],
            populated: 0,
        }
    }

    /// Number of traces stored per prime; also the largest vertex count.
    #[must_use]
    #[rustfmt::skip]
    pub const fn stride(&self) -> usize { self.stride }

    /// Largest vertex count whose table, and every smaller one, is complete.
    #[must_use]
    #[rustfmt::skip]
    pub const fn populated_up_to(&self) -> usize { self.populated }

    /// Marks the table for `nv` vertices as complete, filling it with
    /// `primes` in id order.
    ///
    /// # Panics
    /// Panics unless `nv` is the next unpopulated vertex count within the
    /// stride, or when a prime carries fewer than `stride` traces.
    pub fn populate<'a, I>(&mut self, nv: usize, primes: I)
    where
        I: IntoIterator<Item = &'a [i64]>,
    {
        assert_eq!(
            nv,
            self.populated + 1,
            "prime tables must be populated in vertex-count order"
        );
        assert!(nv <= self.stride, "vertex count {nv} exceeds the stride");
        self.populated = nv;
        for traces in primes {
            self.add_prime(nv, traces);
        }
    }

    /// Appends a newly found prime to an already populated table and
    /// returns its id.
    ///
    /// # Panics
    /// Panics when the table for `nv` is not populated, or when `traces` is
    /// shorter than the stride.
    pub fn add_prime(&mut self, nv: usize, traces: &[i64]) -> TracesId {
        assert!(
            (1..=self.populated).contains(&nv),
            "table for {nv} vertices is not populated"
        );
        let stride = self.stride;
        assert!(
            traces.len() >= stride,
            "prime carries {} traces but the stride is {stride}",
            traces.len()
        );
        let table = &mut self.tables[nv];
        table.push(&traces[..stride]);
        id_for(nv, table.len() - 1)
    }

    /// Number of primes known for `nv` vertices.
    #[must_use]
    pub fn num_primes(&self, nv: usize) -> usize {
        self.tables.get(nv).map_or(0, FactorTable::len)
    }

    /// Looks up the traces of a prime by id.
    #[must_use]
    pub fn prime_traces(&self, id: TracesId) -> Option<&[i64]> {
        let nv = usize::from(id.vertex_count());
        let table = self.tables.get(nv).filter(|_| nv > 0)?;
        let idx = usize::try_from(id.seq()).ok()?.checked_sub(1)?;
        (idx < table.len()).then(|| table.prime(idx, self.stride))
    }

    /// Iterates the ids and traces of every prime with `nv` vertices.
    pub fn primes(&self, nv: usize) -> impl Iterator<Item = (TracesId, &[i64])> + '_ {
        let stride = self.stride;
        self.tables
            .get(nv)
            .filter(|_| nv > 0)
            .into_iter()
            .flat_map(move |table| {
                (0..table.len()).map(move |idx| (id_for(nv, idx), table.prime(idx, stride)))
            })
    }

    /// Sums the first `len` traces of every prime in `factors`, weighted by
    /// multiplicity.
    ///
    /// Returns `None` when a referenced prime is unknown.
    #[must_use]
    pub fn compose(&self, factors: &super::FactorSet, len: usize) -> Option<Traces> {
        let mut sum = vec![0_i64; len.min(self.stride)];
        for run in factors.runs() {
            let traces = self.prime_traces(run.id)?;
            for (out, value) in sum.iter_mut().zip(traces) {
                *out += value * i64::from(run.count);
            }
        }
        Some(Traces::from(sum))
    }

    pub(super) fn table(&self, nv: usize) -> &FactorTable {
        &self.tables[nv]
    }
}

pub(super) fn id_for(nv: usize, idx: usize) -> TracesId {
    TracesId::new(nv as u8, idx as u64 + 1)
}
