//! Printing scan results.

use std::io::Write;
use std::process::ExitCode;

use colored::Colorize;
use importgraph::{Format, Scan, export};

/// Print the graph to stdout and unresolved names with their failures to stderr.
///
/// Returns a failure status if anything was left unresolved.
pub fn report(scan: &Scan, format: Format) -> importgraph::Result<ExitCode> {
    let rendered = export::render(&scan.graph(), format)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    if !rendered.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;

    if scan.is_complete() {
        return Ok(ExitCode::SUCCESS);
    }

    eprintln!("{}", "Unresolved packages:".yellow().bold());
    for (name, reason) in scan.unresolved_reasons() {
        eprintln!("  {} {name} {}", "•".dimmed(), format!("({reason})").dimmed());
    }
    Ok(ExitCode::FAILURE)
}
