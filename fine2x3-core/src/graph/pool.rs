//! Recycling pool for constructions.
//!
//! Free lists are keyed by power-of-two vertex capacity class so a recycled
//! construction rarely needs to reallocate when it is refilled. Constructions
//! leave the pool wrapped in a move-only [`Pooled`] handle which returns them
//! on drop, so a reclaimed construction can never be observed again.

use std::{
    ops::{Deref, DerefMut},
    sync::{Arc, Mutex, OnceLock},
};

use super::{construction::Construction, vertex::MAX_VERTEX_COUNT};

/// Capacity classes 1, 2, 4, ..., 32 vertices.
const CLASS_COUNT: usize = (MAX_VERTEX_COUNT + 1).trailing_zeros() as usize + 1;

/// Upper bound on idle constructions kept per class.
const MAX_IDLE_PER_CLASS: usize = 4096;

/// Smallest class able to hold `vertices`.
fn class_for(vertices: usize) -> usize {
    let class = vertices.max(1).next_power_of_two().trailing_zeros() as usize;
    class.min(CLASS_COUNT - 1)
}

/// Largest class whose size `capacity` covers.
fn class_of_capacity(capacity: usize) -> usize {
    let class = (usize::BITS - 1 - capacity.leading_zeros()) as usize;
    class.min(CLASS_COUNT - 1)
}

/// A shared, thread-safe free list of [`Construction`]s.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use fine2x3_core::{ConstructionPool, GrowOp};
///
/// let pool = Arc::new(ConstructionPool::new());
/// let mut graph = pool.acquire(None);
/// assert!(graph.grow(GrowOp::seed()));
/// let child = pool.acquire(Some(&*graph));
/// assert_eq!(child.vertex_count(), 1);
/// drop(graph);
/// assert_eq!(pool.idle(), 1);
/// ```
#[derive(Debug)]
pub struct ConstructionPool {
    classes: Mutex<Vec<Vec<Construction>>>,
}

impl ConstructionPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            classes: Mutex::new((0..CLASS_COUNT).map(|_| Vec::new()).collect()),
        }
    }

    /// Returns the process-wide pool shared by runs that do not supply their
    /// own.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<ConstructionPool>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(Self::new())))
    }

    /// Takes a construction reset to a copy of `parent` (or to the empty
    /// graph), allocating when the matching class is empty.
    #[must_use]
    pub fn acquire(self: &Arc<Self>, parent: Option<&Construction>) -> Pooled {
        let wanted = parent.map_or(1, |src| src.vertex_count() + 1);
        let recycled = self
            .classes
            .lock()
            .ok()
            .and_then(|mut classes| classes[class_for(wanted)].pop());
        let mut construction =
            recycled.unwrap_or_else(|| Construction::with_capacity(wanted.next_power_of_two()));
        construction.reset_from(parent);
        Pooled {
            construction,
            pool: Arc::clone(self),
        }
    }

    /// Number of idle constructions across all classes.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.classes
            .lock()
            .map_or(0, |classes| classes.iter().map(Vec::len).sum())
    }

    fn release(&self, construction: Construction) {
        let capacity = construction.vertex_capacity();
        if capacity == 0 {
            return;
        }
        // A poisoned lock only loses the recycled allocation.
        if let Ok(mut classes) = self.classes.lock() {
            let list = &mut classes[class_of_capacity(capacity)];
            if list.len() < MAX_IDLE_PER_CLASS {
                list.push(construction);
            }
        }
    }
}

impl Default for ConstructionPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive handle to a pooled [`Construction`].
///
/// Dropping the handle (or calling [`Pooled::reclaim`]) returns the
/// construction to its pool.
#[derive(Debug)]
pub struct Pooled {
    construction: Construction,
    pool: Arc<ConstructionPool>,
}

impl Pooled {
    /// Returns the construction to its pool.
    pub fn reclaim(self) {
        drop(self);
    }

    /// Detaches the construction from the pool.
    #[must_use]
    pub fn into_inner(mut self) -> Construction {
        std::mem::take(&mut self.construction)
    }
}

impl Deref for Pooled {
    type Target = Construction;

    fn deref(&self) -> &Self::Target {
        &self.construction
    }
}

impl DerefMut for Pooled {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.construction
    }
}

impl Drop for Pooled {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.construction));
    }
}
