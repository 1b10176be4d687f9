//! Command-line interface for enumerating and cataloguing 2x3 graphs.
//!
//! `enumerate` lists every graph up to a vertex cap as CSV; `catalog` files
//! the same graphs into an in-memory prime catalog and reports per-size
//! counts, optionally factoring every composite trace vector.

mod commands;
mod render;

pub use commands::{
    CatalogArgs, CatalogReport, Cli, CliError, Command, CompositeRow, EnumerateArgs,
    EnumerationReport, GraphRow, Report, SizeCounts, run_cli,
};
pub use render::render_report;
