//! OxiLha CLI
//!
//! List, test and extract LZH/LHA archives (lh0, lh4 through lh7).

mod commands;
mod utils;

use clap::{Parser, Subcommand};
use commands::{ExtractOptions, ListOptions, cmd_extract, cmd_list, cmd_test};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oxilha")]
#[command(author, version, about = "Pure Rust LZH/LHA archive reader")]
#[command(long_about = "
OxiLha reads LZH/LHA archives with header levels 0 and 1.
Supported methods: -lh0- (stored), -lh4-, -lh5-, -lh6-, -lh7-

Examples:
  oxilha list archive.lzh
  oxilha list --json archive.lzh
  oxilha extract archive.lzh -o out
  oxilha test archive.lzh

Set RUST_LOG (e.g. RUST_LOG=oxilha_lzh=trace) for decoder diagnostics.
")]
struct Cli {
    /// Show verbose output and debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List contents of an archive
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Include only files matching pattern (glob syntax: *.txt, docs/*)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude files matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,
    },

    /// Extract files from an archive
    #[command(alias = "x")]
    Extract {
        /// Archive file to extract
        archive: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Files to extract (all if empty)
        files: Vec<String>,

        /// Include only files matching pattern (glob syntax: *.txt, docs/*)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude files matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Test archive integrity
    #[command(alias = "t")]
    Test {
        /// Archive file to test
        archive: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::List {
            archive,
            json,
            include,
            exclude,
        } => cmd_list(
            &archive,
            &ListOptions {
                verbose: cli.verbose,
                json,
                include: &include,
                exclude: &exclude,
            },
        ),
        Commands::Extract {
            archive,
            output,
            files,
            include,
            exclude,
            progress,
        } => cmd_extract(
            &archive,
            &ExtractOptions {
                output: &output,
                files: &files,
                include: &include,
                exclude: &exclude,
                verbose: cli.verbose,
                progress,
            },
        ),
        Commands::Test { archive } => cmd_test(&archive, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
