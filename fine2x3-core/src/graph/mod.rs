//! The slot-based graph model.
//!
//! Every vertex carries exactly three edge slots. A slot either joins another
//! vertex (which holds a reciprocal slot) or folds inward as a loop. Graphs
//! are grown through [`GrowOp`]s on a [`Construction`] and recycled through a
//! [`ConstructionPool`].

mod construction;
mod def;
mod ops;
mod partition;
mod pool;
mod queue;
mod vertex;

pub use construction::Construction;
pub use def::{EdgeDef, GraphDef};
pub use ops::{GrowOp, OpCode};
pub use pool::{ConstructionPool, Pooled};
pub use queue::GraphQueue;
pub use vertex::{EdgeSlot, MAX_VERTEX_COUNT, SLOTS_PER_VERTEX, Sign, Vertex, VtxId};
