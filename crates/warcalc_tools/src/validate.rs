//! Scenario validation utilities.

use std::path::{Path, PathBuf};

use crate::scenario::{scenario_files, BattleScenario, ScenarioError};

/// A scenario file that failed validation.
#[derive(Debug)]
pub struct ValidationFailure {
    /// Offending file.
    pub path: PathBuf,
    /// What went wrong.
    pub error: ScenarioError,
}

/// Outcome of validating a directory.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Files that parsed and produced valid engagement inputs.
    pub valid: Vec<PathBuf>,
    /// Files that did not.
    pub failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    /// True if every file validated.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Check a single scenario file: it must parse and both armies must reduce
/// to valid engagement inputs.
///
/// # Errors
///
/// Returns the first problem found in the file.
pub fn validate_scenario_file(path: &Path) -> Result<BattleScenario, ScenarioError> {
    let scenario = BattleScenario::load(path)?;
    scenario.params()?.validate()?;
    Ok(scenario)
}

/// Validate all RON scenario files in a directory.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed. Problems with
/// individual files are reported in [`ValidationReport::failures`].
pub fn validate_scenario_directory(path: &Path) -> Result<ValidationReport, ScenarioError> {
    let mut report = ValidationReport::default();
    for file in scenario_files(path)? {
        match validate_scenario_file(&file) {
            Ok(scenario) => {
                tracing::debug!(name = %scenario.name, "Scenario valid");
                report.valid.push(file);
            }
            Err(error) => {
                tracing::warn!("{}: {error}", file.display());
                report.failures.push(ValidationFailure { path: file, error });
            }
        }
    }
    Ok(report)
}
