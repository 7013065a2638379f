//! Importgraph CLI - Go import graphs from the command line.
//!
//! Resolves the transitive imports of a package (or of every package under a
//! directory) and prints the resulting graph. Exits with a failure status when
//! any import could not be resolved.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use importgraph::Format;
use tracing_subscriber::EnvFilter;

mod cli;

/// Importgraph: resolve and export Go import graphs.
#[derive(Parser)]
#[command(name = "importgraph")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to .importgraph.yaml in the scanned directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one package and everything it imports
    Tree {
        /// Import path, or a relative path such as "." or "./cmd/tool"
        #[arg(default_value = ".")]
        package: String,

        /// Directory the package is imported from (defaults to current directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Also follow imports of test files
        #[arg(short, long)]
        tests: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Resolve every package under a directory
    Scan {
        /// Workspace root
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Comma-separated canonical names to leave out; a trailing * matches a prefix
        #[arg(short, long, value_name = "LIST")]
        ignored_pkgs: Option<String>,

        /// Also follow imports of test files
        #[arg(short, long)]
        tests: bool,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Print a Graphviz digraph instead of JSON
    #[arg(long, conflicts_with = "list")]
    dot: bool,

    /// Print the sorted package names only
    #[arg(long)]
    list: bool,
}

impl OutputArgs {
    fn format(&self) -> Format {
        if self.dot {
            Format::Dot
        } else if self.list {
            Format::List
        } else {
            Format::Json
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // stdout carries the graph
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Tree {
            package,
            dir,
            tests,
            output,
        } => match dir.map_or_else(std::env::current_dir, Ok) {
            Ok(dir) => cli::tree::run(
                cli.config.as_deref(),
                &package,
                &dir,
                tests,
                output.format(),
            ),
            Err(e) => {
                eprintln!(
                    "{}: failed to get current directory: {e}",
                    "error".red().bold()
                );
                return ExitCode::FAILURE;
            }
        },
        Commands::Scan {
            root,
            ignored_pkgs,
            tests,
            output,
        } => cli::scan::run(
            cli.config.as_deref(),
            &root,
            ignored_pkgs.as_deref(),
            tests,
            output.format(),
        ),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            // Show cause chain for nested errors
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  {}: {cause}", "caused by".dimmed());
                source = std::error::Error::source(cause);
            }
            ExitCode::FAILURE
        }
    }
}
