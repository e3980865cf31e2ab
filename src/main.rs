//! varmerge: streaming overlap merge for ordered genomic variant loci.
//!
//! Usage: varmerge <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use varmerge::commands::{CheckCommand, GenerateCommand, MergeCommand};
use varmerge::error::MergeError;

#[derive(Parser)]
#[command(name = "varmerge")]
#[command(version)]
#[command(about = "Streaming overlap merge and annotation for positionally-ordered genomic variant loci", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge and annotate a locus stream
    Merge {
        /// Input locus stream (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum passing GQX for site classification
        #[arg(long, default_value_t = 15)]
        min_gqx: i32,

        /// Minimum passing locus quality for site classification
        #[arg(long, default_value_t = 20)]
        min_qual: i32,

        /// Skip inline submission-order validation
        #[arg(long)]
        no_validate: bool,
    },

    /// Validate a locus stream without emitting output
    Check {
        /// Input locus stream (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Generate a synthetic locus stream for testing
    Generate {
        /// Number of records to generate
        #[arg(short = 'n', long, default_value_t = 1000)]
        count: usize,

        /// RNG seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Samples per locus
        #[arg(long, default_value_t = 1)]
        samples: usize,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// True when the path argument means "read stdin".
fn is_stdin(path: &Option<PathBuf>) -> bool {
    match path {
        None => true,
        Some(p) => p == Path::new("-"),
    }
}

fn open_output(path: &Option<PathBuf>) -> Result<Box<dyn Write>, MergeError> {
    match path {
        Some(p) => Ok(Box::new(File::create(p)?)),
        None => Ok(Box::new(io::stdout().lock())),
    }
}

fn run(cli: Cli) -> Result<(), MergeError> {
    match cli.command {
        Commands::Merge {
            input,
            output,
            min_gqx,
            min_qual,
            no_validate,
        } => {
            let cmd = MergeCommand::new()
                .with_min_gqx(min_gqx)
                .with_min_qual(min_qual)
                .with_validation(!no_validate);
            let mut out = open_output(&output)?;
            let stats = match &input {
                p if is_stdin(p) => cmd.run_stdin(&mut out)?,
                Some(p) => cmd.run(p, &mut out)?,
                None => unreachable!(),
            };
            out.flush()?;
            eprintln!("Merge stats: {}", stats);
        }
        Commands::Check { input } => {
            let cmd = CheckCommand::new();
            let stats = match &input {
                p if is_stdin(p) => cmd.run_stdin()?,
                Some(p) => cmd.run(p)?,
                None => unreachable!(),
            };
            eprintln!("{}", stats);
        }
        Commands::Generate {
            count,
            seed,
            samples,
            output,
        } => {
            let cmd = GenerateCommand::new()
                .with_count(count)
                .with_seed(seed)
                .with_samples(samples);
            let mut out = open_output(&output)?;
            let stats = cmd.run(&mut out)?;
            out.flush()?;
            eprintln!("{}", stats);
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
