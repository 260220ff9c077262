//! Command implementations for the scorescript CLI.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use crate::batch::{BatchConfig, BatchScorer};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::document::DocumentStats;
use crate::error::{Result, ScoreScriptError};
use crate::request::{ScorerKind, ScoringParams, ScoringRequest};
use crate::scorer::create_scorer;
use crate::statistics::{
    CollectionStatisticsClient, FileStatisticsStore, StatisticKind, StatisticsConfig,
    StatisticsStore,
};

/// Execute a CLI command.
pub fn execute_command(args: ScoreScriptArgs) -> Result<()> {
    match &args.command {
        Command::Score(score_args) => score_documents(score_args.clone(), &args),
        Command::Lookup(lookup_args) => lookup_statistics(lookup_args.clone(), &args),
    }
}

/// Score a documents file.
fn score_documents(args: ScoreArgs, cli_args: &ScoreScriptArgs) -> Result<()> {
    let kind: ScorerKind = args.scorer.parse()?;
    let params = ScoringParams::from_json_str(&fs::read_to_string(&args.params)?)?;
    let request = Arc::new(ScoringRequest::new(kind, &params)?);

    if cli_args.verbosity() > 1 {
        println!("Loading statistics from: {}", args.stats.display());
    }
    let store: Arc<dyn StatisticsStore> = Arc::new(FileStatisticsStore::open(&args.stats)?);
    let client = CollectionStatisticsClient::open(
        store,
        kind.statistic_kind(),
        StatisticsConfig::default().with_cache(args.cache),
    )?
    .with_verbose(request.verbose());

    let documents = load_documents(&args.documents)?;

    let mut config = BatchConfig::default().with_max_results(args.limit);
    config.num_threads = args.threads;
    let batch = BatchScorer::new(Arc::from(create_scorer(request)), config)?;

    let result = batch.score_all(&documents, &client);
    client.close()?;

    let report = ScoreReport {
        scorer: kind.script_name().to_string(),
        documents: documents.len(),
        scored: result.success_count(),
        duration_ms: result.elapsed.as_millis() as u64,
        hits: result.rank(args.limit),
        failures: result
            .failures()
            .map(|(id, error)| ScoringFailure {
                id: id.to_string(),
                error: error.to_string(),
            })
            .collect(),
    };

    output_score_report(&report, cli_args)
}

/// Resolve statistics for the given terms.
fn lookup_statistics(args: LookupArgs, cli_args: &ScoreScriptArgs) -> Result<()> {
    let kind: StatisticKind = args.kind.parse()?;
    let store: Arc<dyn StatisticsStore> = Arc::new(FileStatisticsStore::open(&args.stats)?);
    let client = CollectionStatisticsClient::open(store, kind, StatisticsConfig::default())?;

    let lookups = args
        .terms
        .iter()
        .map(|term| client.lookup(term))
        .collect::<Result<Vec<_>>>()?;
    client.close()?;

    output_lookup_report(
        &LookupReport {
            kind: kind.to_string(),
            lookups,
        },
        cli_args,
    )
}

/// Load documents from a JSONL file.
///
/// Blank lines are skipped; a malformed line fails the whole load.
pub fn load_documents<P: AsRef<Path>>(path: P) -> Result<Vec<DocumentStats>> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let mut documents = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let mut doc: DocumentStats = serde_json::from_str(&line).map_err(|e| {
            ScoreScriptError::other(format!(
                "Error parsing document on line {}: {e}",
                line_num + 1
            ))
        })?;
        if doc.id.is_empty() {
            doc.id = (line_num + 1).to_string();
        }
        documents.push(doc);
    }

    tracing::debug!(
        path = %path.as_ref().display(),
        documents = documents.len(),
        "loaded documents"
    );

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::NamedTempFile;

    #[test]
    fn test_load_documents() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id": "a", "term_frequencies": {{"cat": 2}}, "length": 10}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"term_frequencies": {{"dog": 1}}, "length": 4}}"#).unwrap();

        let documents = load_documents(file.path()).unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].id, "a");
        assert_eq!(documents[0].length, Some(10));
        // Documents without an id are named after their line.
        assert_eq!(documents[1].id, "3");
    }

    #[test]
    fn test_load_documents_reports_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id": "a", "length": 10}}"#).unwrap();
        writeln!(file, "{{not json").unwrap();

        let err = load_documents(file.path()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
