//! Trace vectors: signed closed-walk counts indexed by walk length.
//!
//! Entry `i` of a [`Traces`] counts the signed closed walks of length `i + 1`
//! through a graph. The [`engine`] computes them, [`codec`] produces the
//! order-preserving catalog key encoding, and [`TracesId`] names stored
//! trace vectors.

pub mod codec;
pub mod engine;
mod id;

use std::ops::Deref;

pub use id::TracesId;

/// Minimum capacity reserved when a trace buffer has to grow.
const MIN_TRACES_CAPACITY: usize = 16;

/// An ordered vector of trace values.
///
/// # Examples
/// ```
/// use fine2x3_core::Traces;
///
/// let a = Traces::from(vec![4, 10, 28]);
/// let b = Traces::from(vec![4, 10]);
/// assert!(a.is_equal(&b));
/// assert!(!a.is_zero());
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Traces(Vec<i64>);

impl Traces {
    /// Creates an empty trace vector.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns `true` when both vectors agree over the shorter length.
    ///
    /// An empty vector is therefore equal to every other vector.
    #[must_use]
    pub fn is_equal(&self, other: &[i64]) -> bool {
        self.0.iter().zip(other).all(|(a, b)| a == b)
    }

    /// Returns `true` when every entry is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&value| value == 0)
    }

    /// Returns `true` when every trace of odd walk length (indices 0, 2, 4,
    /// ...) is zero.
    #[must_use]
    pub fn is_boson(&self) -> bool {
        self.0.iter().step_by(2).all(|&value| value == 0)
    }

    /// Writes `self - delta` into `diff` over the shorter length and reports
    /// whether the difference is all zeros.
    ///
    /// # Examples
    /// ```
    /// use fine2x3_core::Traces;
    ///
    /// let target = Traces::from(vec![6, 18]);
    /// let mut diff = Traces::new();
    /// assert!(!target.subtract(&[3, 9], &mut diff));
    /// assert_eq!(diff.as_slice(), &[3, 9]);
    /// assert!(diff.subtract(&[3, 9], &mut Traces::new()));
    /// ```
    pub fn subtract(&self, delta: &[i64], diff: &mut Self) -> bool {
        let len = self.0.len().min(delta.len());
        diff.set_len(len);
        let mut is_zero = true;
        for ((out, a), b) in diff.0.iter_mut().zip(&self.0).zip(delta) {
            *out = a - b;
            is_zero &= *out == 0;
        }
        is_zero
    }

    /// Resizes to `len` entries, zero-filling new ones.
    pub fn set_len(&mut self, len: usize) {
        if self.0.capacity() < len {
            self.0
                .reserve(len.max(MIN_TRACES_CAPACITY) - self.0.len());
        }
        self.0.resize(len, 0);
    }

    /// Ensures room for `len` entries, growing to the next multiple of four.
    pub(crate) fn reserve_rounded(&mut self, len: usize) {
        if self.0.capacity() < len {
            let rounded = (len + 3) & !3;
            self.0.reserve_exact(rounded - self.0.len());
        }
    }

    #[rustfmt::skip]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [i64] { &mut self.0 }

    /// Borrows the trace values.
    #[must_use]
    #[rustfmt::skip]
    pub fn as_slice(&self) -> &[i64] { &self.0 }

    /// Consumes the vector, returning the raw values.
    #[must_use]
    #[rustfmt::skip]
    pub fn into_vec(self) -> Vec<i64> { self.0 }
}

impl Deref for Traces {
    type Target = [i64];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[i64]> for Traces {
    fn as_ref(&self) -> &[i64] {
        &self.0
    }
}

impl From<Vec<i64>> for Traces {
    fn from(values: Vec<i64>) -> Self {
        Self(values)
    }
}

impl From<&[i64]> for Traces {
    fn from(values: &[i64]) -> Self {
        Self(values.to_vec())
    }
}

impl FromIterator<i64> for Traces {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests;
