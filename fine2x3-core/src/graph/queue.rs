//! FIFO of pooled constructions used by the walker's level queues.

use std::collections::VecDeque;

use super::pool::Pooled;

/// First-in first-out queue of constructions awaiting expansion.
#[derive(Debug, Default)]
pub struct GraphQueue {
    items: VecDeque<Pooled>,
}

impl GraphQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Appends `graph` at the tail.
    pub fn enqueue(&mut self, graph: Pooled) {
        self.items.push_back(graph);
    }

    /// Removes the graph at the head.
    pub fn dequeue(&mut self) -> Option<Pooled> {
        self.items.pop_front()
    }

    #[must_use]
    #[rustfmt::skip]
    pub fn len(&self) -> usize { self.items.len() }

    #[must_use]
    #[rustfmt::skip]
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}
