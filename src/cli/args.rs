//! Command line argument parsing for the scorescript CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// scorescript - relevance scoring over external collection statistics
#[derive(Parser, Debug, Clone)]
#[command(name = "scorescript")]
#[command(about = "Score documents with query likelihood, BM25 and KL divergence models")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct ScoreScriptArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl ScoreScriptArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Score a file of documents
    Score(ScoreArgs),

    /// Resolve collection statistics for terms
    Lookup(LookupArgs),
}

/// Arguments for scoring documents
#[derive(Parser, Debug, Clone)]
pub struct ScoreArgs {
    /// Scorer name or alias (ql, bm25, kl, kl-query)
    #[arg(long, value_name = "SCORER")]
    pub scorer: String,

    /// Scoring parameters file (JSON object)
    #[arg(long, value_name = "PARAMS_FILE")]
    pub params: PathBuf,

    /// Collection statistics file (JSON object of key -> value)
    #[arg(long, value_name = "STATS_FILE")]
    pub stats: PathBuf,

    /// Documents file (JSONL, one document per line)
    #[arg(long, value_name = "DOCUMENTS_FILE")]
    pub documents: PathBuf,

    /// Maximum number of results to return
    #[arg(short, long, default_value = "10")]
    pub limit: usize,

    /// Number of scoring threads (default: number of CPU cores)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Cache resolved statistics for the duration of the run
    #[arg(long)]
    pub cache: bool,
}

/// Arguments for looking up statistics
#[derive(Parser, Debug, Clone)]
pub struct LookupArgs {
    /// Statistic kind (tf or idf)
    #[arg(long, default_value = "tf")]
    pub kind: String,

    /// Collection statistics file (JSON object of key -> value)
    #[arg(long, value_name = "STATS_FILE")]
    pub stats: PathBuf,

    /// Terms to resolve
    #[arg(value_name = "TERM", required = true)]
    pub terms: Vec<String>,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
