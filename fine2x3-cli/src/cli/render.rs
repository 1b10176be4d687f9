//! Plain-text rendering of command reports.

use std::io::{self, Write};

use super::commands::{CatalogReport, EnumerationReport, Report};

/// Renders `report` to `writer`.
///
/// Enumeration reports print one CSV line per graph: index, vertex count,
/// particle count, canonical form, ops, then space-separated traces. Catalog
/// reports print a tab-separated table of counts per vertex count, followed
/// by one line per composite when factorizations were requested.
///
/// # Errors
/// Returns [`io::Error`] if writing to `writer` fails.
///
/// # Examples
/// ```
/// use fine2x3_cli::cli::{Cli, Command, EnumerateArgs, render_report, run_cli};
///
/// let cli = Cli {
///     command: Command::Enumerate(EnumerateArgs {
///         max_vertices: 1,
///         minimal: true,
///         traces: 2,
///     }),
/// };
/// let mut out = Vec::new();
/// render_report(&run_cli(cli)?, &mut out)?;
/// let text = String::from_utf8(out)?;
/// assert!(text.ends_with(",\"3 9\"\n"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn render_report(report: &Report, mut writer: impl Write) -> io::Result<()> {
    match report {
        Report::Enumeration(report) => render_enumeration(report, &mut writer),
        Report::Catalog(report) => render_catalog(report, &mut writer),
    }
}

fn render_enumeration(report: &EnumerationReport, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer, "index,vertices,particles,canonical,ops,traces")?;
    for row in &report.rows {
        writeln!(
            writer,
            "{},{},{},\"{}\",\"{}\",\"{}\"",
            row.index,
            row.vertex_count,
            row.particle_count,
            row.canonical,
            row.ops,
            join(&row.traces, " "),
        )?;
    }
    Ok(())
}

fn render_catalog(report: &CatalogReport, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer, "trace count: {}", report.trace_count)?;
    writeln!(writer, "vertices\ttraces\tprimes")?;
    for size in &report.sizes {
        writeln!(writer, "{}\t{}\t{}", size.vertices, size.traces, size.primes)?;
    }
    for composite in &report.composites {
        writeln!(
            writer,
            "[{}] = {}",
            join(&composite.traces, ","),
            composite.factorizations.join(" | "),
        )?;
    }
    Ok(())
}

fn join(values: &[i64], separator: &str) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}
