//! Benchmark setup error type.

use fine2x3_core::{CatalogError, EnumError, GraphError};

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// A benchmark graph could not be built.
    #[error("graph construction failed: {0}")]
    Graph(#[from] GraphError),
    /// Enumeration could not start.
    #[error("enumeration failed: {0}")]
    Enum(#[from] EnumError),
    /// Filling or querying the catalog failed.
    #[error("catalog operation failed: {0}")]
    Catalog(#[from] CatalogError),
    /// Random growth never reached the requested size.
    #[error("random growth stalled before reaching {target} vertices")]
    GrowthStalled {
        /// Requested vertex count.
        target: usize,
    },
}
