//! codeintel - drive a code intelligence engine from the command line.
//!
//! This is the main entry point for the codeintel CLI.

mod commands;

use clap::{Parser, Subcommand};
use commands::{init_logging, list_languages, run_query, show_config, Query};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codeintel")]
#[command(author, version, about = "Code intelligence for editors", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Project directory (defaults to the current directory)
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the merged configuration and where it came from
    Config,
    /// Start the configured engine and list the languages it supports
    Languages,
    /// Ask the engine for completions at a position
    Complete {
        /// Source file
        file: PathBuf,
        /// Line, starting at 1
        #[arg(long)]
        line: usize,
        /// Column in characters, starting at 1
        #[arg(long)]
        col: usize,
    },
    /// Ask the engine where the symbol at a position is defined
    Definition {
        /// Source file
        file: PathBuf,
        /// Line, starting at 1
        #[arg(long)]
        line: usize,
        /// Column in characters, starting at 1
        #[arg(long)]
        col: usize,
    },
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = init_logging(cli.verbose, cli.log_file);
    if let Some(path) = &log_file {
        tracing::debug!(path = %path.display(), "Logging to file");
    }

    let project = match cli.project {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Config => show_config(&project).await,
        Commands::Languages => list_languages(&project).await,
        Commands::Complete { file, line, col } => {
            run_query(&project, &file, line, col, Query::Complete).await
        }
        Commands::Definition { file, line, col } => {
            run_query(&project, &file, line, col, Query::Definition).await
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Print version information.
fn print_version() {
    println!("codeintel {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Completions, call-tips and go-to-definition backed by an external engine.");
}
