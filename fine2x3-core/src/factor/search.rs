//! Backtracking decomposition of trace vectors into known primes.

use std::{
    collections::BTreeSet,
    ops::ControlFlow,
    sync::mpsc::{self, Receiver},
    thread,
};

use tracing::{Span, field, instrument};

use super::{
    FactorSet,
    table::{FactorCatalog, id_for},
};
use crate::{traces::TracesId, walker::CancelToken};

/// Messages passed from the search to the collector.
///
/// A factorization is framed as its prime refs followed by `RunComplete`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FactorMessage {
    /// One prime occurrence of the factorization in progress.
    FactorRef(TracesId),
    /// The factorization in progress is complete.
    RunComplete,
}

/// Capacity of the channel between the search and its collector.
const FACTOR_CHANNEL_CAPACITY: usize = 8;

/// Deduplicated factorizations of a trace vector, in [`FactorSet`] order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Factorizations {
    sets: Vec<FactorSet>,
    complete: bool,
}

impl Factorizations {
    #[must_use]
    #[rustfmt::skip]
    pub fn sets(&self) -> &[FactorSet] { &self.sets }

    #[must_use]
    #[rustfmt::skip]
    pub fn into_sets(self) -> Vec<FactorSet> { self.sets }

    /// `false` when the search was cancelled before exhausting its space.
    #[must_use]
    #[rustfmt::skip]
    pub const fn is_complete(&self) -> bool { self.complete }

    #[must_use]
    #[rustfmt::skip]
    pub fn len(&self) -> usize { self.sets.len() }

    #[must_use]
    #[rustfmt::skip]
    pub fn is_empty(&self) -> bool { self.sets.is_empty() }
}

impl IntoIterator for Factorizations {
    type Item = FactorSet;
    type IntoIter = std::vec::IntoIter<FactorSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.sets.into_iter()
    }
}

/// Depth-first search state: one remainder row per depth and the path of
/// `(vertex count, table index)` choices leading to it.
struct FactorSearch<'a> {
    primes: &'a FactorCatalog,
    cancel: Option<&'a CancelToken>,
    len: usize,
    max_factor: usize,
    remainders: Vec<i64>,
    path: Vec<(usize, usize)>,
    hits: u64,
    cancelled: bool,
}

impl<'a> FactorSearch<'a> {
    fn new(primes: &'a FactorCatalog, target: &[i64], max_factor: usize) -> Self {
        let len = target.len();
        let mut remainders = vec![0; (len + 1) * len];
        remainders[..len].copy_from_slice(target);
        Self {
            primes,
            cancel: None,
            len,
            max_factor,
            remainders,
            path: Vec::with_capacity(len),
            hits: 0,
            cancelled: false,
        }
    }

    fn run<F>(&mut self, emit: &mut F)
    where
        F: FnMut(&[(usize, usize)]) -> ControlFlow<()>,
    {
        let _ = self.descend(0, 1, self.len, emit);
    }

    fn descend<F>(
        &mut self,
        depth: usize,
        vi_start: usize,
        remain: usize,
        emit: &mut F,
    ) -> ControlFlow<()>
    where
        F: FnMut(&[(usize, usize)]) -> ControlFlow<()>,
    {
        let primes = self.primes;
        let len = self.len;
        let stride = primes.stride();
        for vi in vi_start..=remain.min(self.max_factor) {
            let table = primes.table(vi);
            for fi in 0..table.len() {
                if self.cancel.is_some_and(CancelToken::is_cancelled) {
                    self.cancelled = true;
                    return ControlFlow::Break(());
                }
                let prime = &table.prime(fi, stride)[..len];
                let (head, tail) = self.remainders.split_at_mut((depth + 1) * len);
                let current = &head[depth * len..];
                let next = &mut tail[..len];
                let mut is_zero = true;
                for ((out, have), take) in next.iter_mut().zip(current).zip(prime) {
                    *out = have - take;
                    is_zero &= *out == 0;
                }

                self.path.truncate(depth);
                self.path.push((vi, fi));
                if vi < remain {
                    self.descend(depth + 1, vi, remain - vi, emit)?;
                } else if is_zero {
                    self.hits += 1;
                    emit(&self.path)?;
                }
            }
        }
        ControlFlow::Continue(())
    }
}

impl FactorCatalog {
    /// Returns `true` when `target` has no decomposition into two or more
    /// known primes.
    ///
    /// Only primes smaller than `target.len()` vertices are considered, so
    /// the tables must be populated up to `target.len() - 1`. Vectors of
    /// length zero or one are prime.
    ///
    /// # Panics
    /// Panics when the required prime tables are not populated or `target`
    /// is longer than the stride.
    #[must_use]
    pub fn is_prime(&self, target: &[i64]) -> bool {
        let len = target.len();
        if len <= 1 {
            return true;
        }
        self.check_populated(len, len - 1);
        let mut search = FactorSearch::new(self, target, len - 1);
        search.run(&mut |_path| ControlFlow::Break(()));
        search.hits == 0
    }

    /// Finds every multiset of known primes whose traces sum to `target`.
    ///
    /// The tables must be populated up to `target.len()` vertices.
    ///
    /// # Panics
    /// Panics when the required prime tables are not populated or `target`
    /// is longer than the stride.
    ///
    /// # Examples
    /// ```
    /// use fine2x3_core::FactorCatalog;
    ///
    /// let mut primes = FactorCatalog::new(2);
    /// primes.populate(1, [&[3_i64, 9][..]]);
    /// primes.populate(2, [&[4_i64, 10][..]]);
    ///
    /// let found = primes.find_factorizations(&[6, 18]);
    /// assert_eq!(found.len(), 1);
    /// assert_eq!(found.sets()[0].to_string(), "1-1^2");
    /// assert!(primes.find_factorizations(&[5, 11]).is_empty());
    /// ```
    #[must_use]
    pub fn find_factorizations(&self, target: &[i64]) -> Factorizations {
        self.search_factorizations(target, None)
    }

    /// Like [`FactorCatalog::find_factorizations`], but stops early once
    /// `cancel` fires; the result then reports itself incomplete.
    ///
    /// # Panics
    /// Panics under the same conditions as
    /// [`FactorCatalog::find_factorizations`].
    #[must_use]
    pub fn find_factorizations_with_cancel(
        &self,
        target: &[i64],
        cancel: &CancelToken,
    ) -> Factorizations {
        self.search_factorizations(target, Some(cancel))
    }

    #[instrument(
        name = "factor.find_factorizations",
        skip(self, target, cancel),
        fields(target_len = target.len(), factorizations = field::Empty),
    )]
    fn search_factorizations(
        &self,
        target: &[i64],
        cancel: Option<&CancelToken>,
    ) -> Factorizations {
        let len = target.len();
        if len == 0 {
            return Factorizations {
                sets: Vec::new(),
                complete: true,
            };
        }
        self.check_populated(len, len);

        let (inlet, outlet) = mpsc::sync_channel(FACTOR_CHANNEL_CAPACITY);
        let (sets, complete) = thread::scope(|scope| {
            let producer = scope.spawn(move || {
                let mut search = FactorSearch::new(self, target, len);
                search.cancel = cancel;
                search.run(&mut |path| {
                    for &(nv, idx) in path {
                        if inlet.send(FactorMessage::FactorRef(id_for(nv, idx))).is_err() {
                            return ControlFlow::Break(());
                        }
                    }
                    match inlet.send(FactorMessage::RunComplete) {
                        Ok(()) => ControlFlow::Continue(()),
                        Err(_) => ControlFlow::Break(()),
                    }
                });
                !search.cancelled
            });
            let sets = collect_factor_sets(&outlet);
            let complete = match producer.join() {
                Ok(complete) => complete,
                Err(panic) => std::panic::resume_unwind(panic),
            };
            (sets, complete)
        });

        Span::current().record("factorizations", sets.len());
        Factorizations {
            sets: sets.into_iter().collect(),
            complete,
        }
    }

    fn check_populated(&self, len: usize, needed: usize) {
        assert!(
            len <= self.stride(),
            "target carries {len} traces but primes store only {}",
            self.stride()
        );
        assert!(
            self.populated_up_to() >= needed,
            "prime tables are populated up to {} vertices but {needed} are needed",
            self.populated_up_to()
        );
    }
}

/// Reads framed factor refs until the channel closes, deduplicating the
/// completed sets.
fn collect_factor_sets(outlet: &Receiver<FactorMessage>) -> BTreeSet<FactorSet> {
    let mut found = BTreeSet::new();
    let mut current = FactorSet::new();
    for message in outlet {
        match message {
            FactorMessage::FactorRef(id) => current.insert(id),
            FactorMessage::RunComplete => {
                if !current.is_empty() {
                    found.insert(std::mem::take(&mut current));
                }
            }
        }
    }
    found
}
