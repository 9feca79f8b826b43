#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

use crate::compare::{CompareArgs, run_compare};
use crate::convert::{ConvertArgs, run_convert};
use crate::determinism::{DeterminismArgs, run_determinism};
use crate::hash::{HashArgs, run_hash};
use seqcheck_harness::Result;

#[derive(Debug, Parser)]
#[command(
    name = "seqcheck",
    about = "Verify that independent video read paths agree frame for frame",
    version
)]
pub struct Cli {
    /// Machine-readable output on stdout (and errors as JSON on stderr).
    #[arg(long, global = true)]
    pub json: bool,

    /// Only log warnings and errors unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare sources against the first one under every access order.
    Compare(CompareArgs),

    /// Decode or re-read one source repeatedly and check the output is stable.
    Determinism(DeterminismArgs),

    /// Copy a source into a new sequence, keeping frame indices.
    Convert(ConvertArgs),

    /// Print the digest of every frame of a source.
    Hash(HashArgs),
}

pub fn run(cli: Cli) -> Result<()> {
    let json = cli.json;
    match cli.command {
        Commands::Compare(args) => run_compare(args, json),
        Commands::Determinism(args) => run_determinism(args, json),
        Commands::Convert(args) => run_convert(args, json),
        Commands::Hash(args) => run_hash(args, json),
    }
}
