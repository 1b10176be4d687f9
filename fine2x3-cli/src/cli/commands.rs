//! Command implementations and argument parsing for the fine2x3 CLI.

use std::ops::ControlFlow;

use clap::{Args, Parser, Subcommand};
use fine2x3_core::{
    AddSummary, CatalogError, CatalogOpts, EnumError, EnumOpts, MemoryStore, Selector,
    WalkSummary, WalkerVariant, canonicalise, enumerate,
};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "fine2x3", about = "Enumerate and catalogue 2x3 graphs.")]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// List every graph up to a vertex cap, one CSV line each.
    Enumerate(EnumerateArgs),
    /// Build an in-memory prime catalog and report its contents.
    Catalog(CatalogArgs),
}

/// Options accepted by the `enumerate` command.
#[derive(Debug, Args, Clone)]
pub struct EnumerateArgs {
    /// Largest vertex count to enumerate.
    #[arg(long = "max-vertices", value_parser = clap::value_parser!(usize))]
    pub max_vertices: usize,

    /// Skip edge splits and grow by duplication and sprouting only.
    #[arg(long)]
    pub minimal: bool,

    /// Number of traces printed per graph (defaults to its vertex count).
    #[arg(long, default_value_t = 0)]
    pub traces: usize,
}

/// Options accepted by the `catalog` command.
#[derive(Debug, Args, Clone)]
pub struct CatalogArgs {
    /// Largest vertex count to enumerate into the catalog.
    #[arg(long = "max-vertices", value_parser = clap::value_parser!(usize))]
    pub max_vertices: usize,

    /// Traces kept per catalog entry (defaults to the catalog default).
    #[arg(long, default_value_t = 0)]
    pub traces: usize,

    /// Also factor every composite trace vector into primes.
    #[arg(long)]
    pub factor: bool,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The catalog cannot hold graphs as large as the enumeration cap.
    #[error("a catalog keeping {traces} traces cannot hold graphs of {max_vertices} vertices")]
    TraceCountTooSmall {
        /// Requested trace count.
        traces: usize,
        /// Requested vertex cap.
        max_vertices: usize,
    },
    /// Enumeration could not start.
    #[error(transparent)]
    Enum(#[from] EnumError),
    /// A catalog operation failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl CliError {
    /// Stable code of the underlying core error, when there is one.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::TraceCountTooSmall { .. } => None,
            Self::Enum(err) => Some(err.code().as_str()),
            Self::Catalog(err) => Some(err.code().as_str()),
        }
    }
}

/// One enumerated graph.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GraphRow {
    /// Zero-based emission index.
    pub index: u64,
    /// Number of vertices.
    pub vertex_count: usize,
    /// Number of connected components.
    pub particle_count: usize,
    /// Canonical form in its ASCII rendering.
    pub canonical: String,
    /// Grow ops that built the graph.
    pub ops: String,
    /// Leading traces.
    pub traces: Vec<i64>,
}

/// Output of the `enumerate` command.
#[derive(Clone, Debug)]
pub struct EnumerationReport {
    /// Graphs in emission order.
    pub rows: Vec<GraphRow>,
    /// Walker counters.
    pub summary: WalkSummary,
}

/// Stored trace and prime counts for one vertex count.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SizeCounts {
    /// Vertex count.
    pub vertices: usize,
    /// Distinct trace vectors stored.
    pub traces: u64,
    /// Prime trace vectors stored.
    pub primes: u64,
}

/// Factorizations found for one composite trace vector.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompositeRow {
    /// The composite's traces, one per vertex.
    pub traces: Vec<i64>,
    /// Each factorization rendered as `id^count` runs.
    pub factorizations: Vec<String>,
}

/// Output of the `catalog` command.
#[derive(Clone, Debug)]
pub struct CatalogReport {
    /// Trace count the catalog was opened with.
    pub trace_count: usize,
    /// Counts per vertex count, ascending.
    pub sizes: Vec<SizeCounts>,
    /// Outcome of adding the enumerated graphs.
    pub added: AddSummary,
    /// Composite factorizations, present when requested.
    pub composites: Vec<CompositeRow>,
}

/// Output of any CLI command.
#[derive(Clone, Debug)]
pub enum Report {
    /// Output of `enumerate`.
    Enumeration(EnumerationReport),
    /// Output of `catalog`.
    Catalog(CatalogReport),
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when the options are invalid or a core operation
/// fails.
///
/// # Examples
/// ```
/// use fine2x3_cli::cli::{Cli, Command, EnumerateArgs, Report, run_cli};
///
/// let cli = Cli {
///     command: Command::Enumerate(EnumerateArgs {
///         max_vertices: 2,
///         minimal: false,
///         traces: 0,
///     }),
/// };
/// let Report::Enumeration(report) = run_cli(cli)? else {
///     unreachable!("enumerate reports graphs");
/// };
/// assert_eq!(report.rows.len(), 4);
/// # Ok::<(), fine2x3_cli::cli::CliError>(())
/// ```
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<Report, CliError> {
    let span = Span::current();
    match cli.command {
        Command::Enumerate(args) => {
            span.record("command", field::display("enumerate"));
            run_enumerate(&args).map(Report::Enumeration)
        }
        Command::Catalog(args) => {
            span.record("command", field::display("catalog"));
            run_catalog(&args).map(Report::Catalog)
        }
    }
}

#[instrument(
    name = "cli.enumerate",
    err,
    skip(args),
    fields(max_vertices = args.max_vertices, minimal = args.minimal),
)]
pub(super) fn run_enumerate(args: &EnumerateArgs) -> Result<EnumerationReport, CliError> {
    let variant = if args.minimal {
        WalkerVariant::Minimal
    } else {
        WalkerVariant::WithSplits
    };
    let walker = EnumOpts::new(args.max_vertices)
        .with_variant(variant)
        .build()?;

    let mut rows = Vec::new();
    let summary = walker.run(|mut graph| {
        let traces = graph.traces(args.traces).to_vec();
        rows.push(GraphRow {
            index: rows.len() as u64,
            vertex_count: graph.vertex_count(),
            particle_count: graph.particle_count(),
            canonical: canonicalise(&graph).to_ascii(),
            ops: graph.ops_string(),
            traces,
        });
        ControlFlow::Continue(())
    });
    info!(graphs = rows.len(), "enumeration command completed");
    Ok(EnumerationReport { rows, summary })
}

#[instrument(
    name = "cli.catalog",
    err,
    skip(args),
    fields(max_vertices = args.max_vertices, factor = args.factor),
)]
pub(super) fn run_catalog(args: &CatalogArgs) -> Result<CatalogReport, CliError> {
    let opts = CatalogOpts::new()
        .with_trace_count(args.traces)
        .with_primes(true);
    if opts.trace_count() < args.max_vertices {
        return Err(CliError::TraceCountTooSmall {
            traces: opts.trace_count(),
            max_vertices: args.max_vertices,
        });
    }
    let catalog = opts.open(MemoryStore::new())?;
    let added = enumerate(EnumOpts::new(args.max_vertices))?.add_to(&catalog)?;

    let sizes = (1..=args.max_vertices)
        .map(|vertices| {
            Ok(SizeCounts {
                vertices,
                traces: catalog.num_traces(vertices)?,
                primes: catalog.num_primes(vertices)?,
            })
        })
        .collect::<Result<Vec<_>, CatalogError>>()?;

    let mut composites = Vec::new();
    if args.factor {
        let selector = Selector::vertices(1, args.max_vertices).with_unique_traces(true);
        for mut graph in catalog.select(selector)? {
            let nv = graph.vertex_count();
            let traces = graph.traces(nv).to_vec();
            let is_prime = catalog
                .lookup(&traces)?
                .is_some_and(|entry| entry.flags().is_prime());
            if is_prime {
                continue;
            }
            let factorizations = catalog
                .select_factorizations(&traces)?
                .iter()
                .map(|found| found.factors().to_string())
                .collect();
            composites.push(CompositeRow {
                traces,
                factorizations,
            });
        }
    }

    info!(
        new_traces = added.new_traces(),
        new_primes = added.new_primes(),
        composites = composites.len(),
        "catalog command completed"
    );
    Ok(CatalogReport {
        trace_count: catalog.trace_count(),
        sizes,
        added,
        composites,
    })
}
