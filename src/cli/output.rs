//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::batch::ScoredDocument;
use crate::cli::args::{OutputFormat, ScoreScriptArgs};
use crate::error::Result;
use crate::statistics::StatisticLookup;

/// A document whose scoring failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringFailure {
    pub id: String,
    pub error: String,
}

/// Result structure for the score command.
#[derive(Debug, Serialize)]
pub struct ScoreReport {
    pub scorer: String,
    pub documents: usize,
    pub scored: usize,
    pub duration_ms: u64,
    pub hits: Vec<ScoredDocument>,
    pub failures: Vec<ScoringFailure>,
}

/// Result structure for the lookup command.
#[derive(Debug, Serialize)]
pub struct LookupReport {
    pub kind: String,
    pub lookups: Vec<StatisticLookup>,
}

/// Print a score report in the selected format.
pub fn output_score_report(report: &ScoreReport, args: &ScoreScriptArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => output_json(report, args),
        OutputFormat::Human => {
            if args.verbosity() > 0 {
                println!(
                    "Scored {}/{} documents with {} in {} ms",
                    report.scored, report.documents, report.scorer, report.duration_ms
                );
                println!();
            }

            for (rank, hit) in report.hits.iter().enumerate() {
                println!("{:>4}. {:<24} {:.6}", rank + 1, hit.id, hit.score);
            }

            if !report.failures.is_empty() {
                println!();
                println!("Failed documents:");
                for failure in &report.failures {
                    println!("  {}: {}", failure.id, failure.error);
                }
            }
            Ok(())
        }
    }
}

/// Print a lookup report in the selected format.
pub fn output_lookup_report(report: &LookupReport, args: &ScoreScriptArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => output_json(report, args),
        OutputFormat::Human => {
            for lookup in &report.lookups {
                let source = if lookup.fallback_used {
                    " (fallback)"
                } else {
                    ""
                };
                println!("{:<24} {} = {}{}", lookup.term, lookup.key, lookup.value, source);
            }
            Ok(())
        }
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &ScoreScriptArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}
