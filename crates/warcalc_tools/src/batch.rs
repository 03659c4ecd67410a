//! Batch engagement runner.
//!
//! Resolves every scenario in a directory in parallel with rayon and
//! aggregates the outcomes. Engagements share no state, so the results are
//! identical to running them one by one.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use warcalc_core::report::{EngagementReport, Outcome};

use crate::scenario::{scenario_files, BattleScenario, ScenarioError};

/// One resolved scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRun {
    /// Scenario name.
    pub name: String,
    /// File the scenario came from.
    pub source: PathBuf,
    /// Engagement result.
    pub report: EngagementReport,
}

/// A scenario that failed to load or resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// File the scenario came from.
    pub source: PathBuf,
    /// Error message.
    pub message: String,
}

/// Outcome counts across a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Engagements the attacker lost.
    pub attacker_defeats: u32,
    /// Engagements the defender lost.
    pub defender_defeats: u32,
    /// Drawn engagements.
    pub draws: u32,
}

impl BatchSummary {
    /// Tally the outcomes of `runs`.
    #[must_use]
    pub fn from_runs(runs: &[ScenarioRun]) -> Self {
        runs.iter().fold(Self::default(), |mut summary, run| {
            match run.report.outcome {
                Outcome::AttackerDefeated => summary.attacker_defeats += 1,
                Outcome::DefenderDefeated => summary.defender_defeats += 1,
                Outcome::Draw => summary.draws += 1,
            }
            summary
        })
    }

    /// Total engagements counted.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.attacker_defeats + self.defender_defeats + self.draws
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Resolved scenarios, in file order.
    pub runs: Vec<ScenarioRun>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Scenarios that failed.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

fn run_file(path: &Path) -> Result<ScenarioRun, ScenarioError> {
    let scenario = BattleScenario::load(path)?;
    let report = scenario.run()?;
    Ok(ScenarioRun {
        name: scenario.name,
        source: path.to_path_buf(),
        report,
    })
}

/// Resolve the given scenario files in parallel.
#[must_use]
pub fn run_batch(files: &[PathBuf]) -> BatchResults {
    let start = Instant::now();
    info!("Starting batch run: {} scenarios", files.len());

    let results: Vec<Result<ScenarioRun, BatchError>> = files
        .par_iter()
        .map(|path| {
            run_file(path).map_err(|e| {
                warn!("Scenario {} failed: {e}", path.display());
                BatchError {
                    source: path.clone(),
                    message: e.to_string(),
                }
            })
        })
        .collect();

    let (runs, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let runs: Vec<ScenarioRun> = runs.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_runs(&runs);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} resolved, {} failed in {:.3}s",
        runs.len(),
        errors.len(),
        duration_seconds
    );

    BatchResults {
        runs,
        summary,
        duration_seconds,
        errors,
    }
}

/// Resolve every scenario file in `dir`.
///
/// # Errors
///
/// Returns an error if `dir` cannot be listed. Individual scenario failures
/// are collected in [`BatchResults::errors`].
pub fn run_directory(dir: &Path) -> Result<BatchResults, ScenarioError> {
    let files = scenario_files(dir)?;
    Ok(run_batch(&files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use warcalc_core::engagement::simulate;
    use warcalc_test_utils::fixtures::reference_engagement;

    fn run_of(report: EngagementReport) -> ScenarioRun {
        ScenarioRun {
            name: "test".to_string(),
            source: PathBuf::from("test.ron"),
            report,
        }
    }

    #[test]
    fn test_summary_counts_outcomes() {
        let mut draw = simulate(&reference_engagement()).unwrap();
        draw.outcome = Outcome::Draw;
        let mut lost = draw.clone();
        lost.outcome = Outcome::AttackerDefeated;

        let summary = BatchSummary::from_runs(&[run_of(draw.clone()), run_of(lost), run_of(draw)]);
        assert_eq!(summary.draws, 2);
        assert_eq!(summary.attacker_defeats, 1);
        assert_eq!(summary.defender_defeats, 0);
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_missing_files_become_errors() {
        let results = run_batch(&[PathBuf::from("nowhere/a.ron"), PathBuf::from("nowhere/b.ron")]);
        assert!(results.runs.is_empty());
        assert_eq!(results.errors.len(), 2);
        assert_eq!(results.errors[0].source, PathBuf::from("nowhere/a.ron"));
        assert_eq!(results.summary.total(), 0);
    }
}
