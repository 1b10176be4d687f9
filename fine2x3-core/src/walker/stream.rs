//! Streaming a walk from a worker thread.

use std::{
    ops::ControlFlow,
    sync::mpsc::{self, Receiver},
    thread::{self, JoinHandle},
};

use tracing::{Span, debug};

use super::{GraphWalker, WalkSummary};
use crate::{
    catalog::{AddSummary, Catalog, CatalogStore},
    error::{CatalogError, EnumError},
    graph::Pooled,
};

/// Graphs produced by a walker running on its own thread.
///
/// Iterating receives graphs in emission order. Dropping the stream (or
/// calling [`EnumStream::join`]) disconnects the channel; the walker notices
/// on its next send and stops.
#[derive(Debug)]
pub struct EnumStream {
    outlet: Receiver<Pooled>,
    worker: JoinHandle<WalkSummary>,
}

impl EnumStream {
    pub(super) fn spawn(walker: GraphWalker) -> Result<Self, EnumError> {
        let (inlet, outlet) = mpsc::sync_channel(walker.channel_capacity);
        let dispatch = tracing::dispatcher::get_default(Clone::clone);
        let parent = Span::current();
        let worker = thread::Builder::new()
            .name("fine2x3-walker".into())
            .spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || {
                    parent.in_scope(|| {
                        walker.run(|graph| match inlet.send(graph) {
                            Ok(()) => ControlFlow::Continue(()),
                            Err(_) => {
                                debug!("enumeration consumer disconnected");
                                ControlFlow::Break(())
                            }
                        })
                    })
                })
            })
            .map_err(|source| EnumError::Spawn { source })?;
        Ok(Self { outlet, worker })
    }

    /// Disconnects from the walker and waits for it to finish.
    ///
    /// Returns `None` if the worker panicked.
    #[must_use]
    pub fn join(self) -> Option<WalkSummary> {
        let Self { outlet, worker } = self;
        drop(outlet);
        worker.join().ok()
    }

    /// Adds every remaining graph to `catalog`.
    ///
    /// # Errors
    /// Returns the first [`CatalogError`]; the walker is disconnected and
    /// stops when that happens.
    pub fn add_to<S: CatalogStore>(self, catalog: &Catalog<S>) -> Result<AddSummary, CatalogError> {
        let mut summary = AddSummary::default();
        for mut graph in self {
            summary.record(catalog.try_add_graph(&mut graph)?);
        }
        Ok(summary)
    }
}

impl Iterator for EnumStream {
    type Item = Pooled;

    fn next(&mut self) -> Option<Self::Item> {
        self.outlet.recv().ok()
    }
}
