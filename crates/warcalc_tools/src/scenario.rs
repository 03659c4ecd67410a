//! Battle scenario definitions.
//!
//! A scenario names two armies and a horizon. Scenarios live as RON files
//! under `scenarios/` so balance tweaks never need a rebuild.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use warcalc_core::army::Army;
use warcalc_core::engagement::{simulate, EngagementParams};
use warcalc_core::error::GameError;
use warcalc_core::report::EngagementReport;

/// Default horizon when a scenario does not name one.
pub const DEFAULT_HORIZON_DAYS: u32 = 30;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Scenario parsed but its armies cannot fight.
    #[error("Invalid scenario: {0}")]
    Invalid(#[from] GameError),
}

const fn default_horizon() -> u32 {
    DEFAULT_HORIZON_DAYS
}

/// A complete engagement setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleScenario {
    /// Scenario name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Number of days the engagement may last.
    #[serde(default = "default_horizon")]
    pub horizon_days: u32,
    /// The attacking army.
    pub attacker: Army,
    /// The defending army.
    pub defender: Army,
}

impl BattleScenario {
    /// Create a scenario from two armies.
    #[must_use]
    pub fn new(name: impl Into<String>, attacker: Army, defender: Army, horizon_days: u32) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            horizon_days,
            attacker,
            defender,
        }
    }

    /// Load scenario from a RON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or not a valid
    /// scenario.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario = Self::from_ron_str(&contents)?;
        tracing::debug!(name = %scenario.name, path = %path.display(), "Loaded scenario");
        Ok(scenario)
    }

    /// Load from a RON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid scenario.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Reduce both armies to simulator input.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Invalid`] if either army fails validation or
    /// the roles are swapped.
    pub fn params(&self) -> Result<EngagementParams, ScenarioError> {
        Ok(EngagementParams::between(
            &self.attacker,
            &self.defender,
            self.horizon_days,
        )?)
    }

    /// Resolve the engagement.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Invalid`] if the scenario cannot be turned
    /// into a valid engagement.
    pub fn run(&self) -> Result<EngagementReport, ScenarioError> {
        let report = simulate(&self.params()?)?;
        tracing::info!(
            name = %self.name,
            outcome = ?report.outcome,
            duration = report.duration,
            "Scenario resolved"
        );
        Ok(report)
    }

    /// The hill offensive: a mixed corps with four reinforcement waves
    /// attacking a garrison holding high ground.
    #[must_use]
    pub fn hill_offensive() -> Self {
        Self {
            name: "hill_offensive".to_string(),
            description: "Mixed corps pushes a garrison off the hills".to_string(),
            horizon_days: DEFAULT_HORIZON_DAYS,
            attacker: Army::hill_assault(),
            defender: Army::hill_garrison(),
        }
    }
}

/// All `.ron` files directly inside `dir`, sorted by path.
///
/// # Errors
///
/// Returns an error if `dir` does not exist or cannot be listed.
pub fn scenario_files(dir: &Path) -> Result<Vec<PathBuf>, ScenarioError> {
    if !dir.is_dir() {
        return Err(ScenarioError::FileNotFound(dir.display().to_string()));
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "ron") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
