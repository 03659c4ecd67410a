//! Engagement results and their human-readable summary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::side::Side;

/// Verdict of an engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The attacker broke or was annihilated.
    AttackerDefeated,
    /// The defender broke or was annihilated.
    DefenderDefeated,
    /// Neither side prevailed.
    Draw,
}

impl Outcome {
    /// The defeated side, if any.
    #[must_use]
    pub const fn loser(self) -> Option<Side> {
        match self {
            Self::AttackerDefeated => Some(Side::Attacker),
            Self::DefenderDefeated => Some(Side::Defender),
            Self::Draw => None,
        }
    }

    /// The prevailing side, if any.
    #[must_use]
    pub const fn winner(self) -> Option<Side> {
        match self.loser() {
            Some(side) => Some(side.opponent()),
            None => None,
        }
    }

    /// Outcome in which `side` is defeated.
    #[must_use]
    pub const fn defeat_of(side: Side) -> Self {
        match side {
            Side::Attacker => Self::AttackerDefeated,
            Side::Defender => Self::DefenderDefeated,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttackerDefeated => f.write_str("Attacker lost the battle."),
            Self::DefenderDefeated => f.write_str("Defender lost the battle."),
            Self::Draw => f.write_str("The battle was evenly matched."),
        }
    }
}

/// Why the engagement stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Termination {
    /// A side's cumulative loss ratio exceeded its threshold.
    Threshold,
    /// A side's troops fell to zero or below.
    Annihilation,
    /// The horizon was reached without either side breaking.
    Horizon,
}

/// Per-side figures of a finished engagement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideReport {
    /// Troops on the field on day 0.
    pub initial_troops: f64,
    /// Initial troops plus reinforcements that arrived by the last day.
    pub committed_troops: f64,
    /// Casualties inflicted by the enemy.
    pub combat_losses: f64,
    /// One-off non-combat attrition of the initial troops.
    pub non_combat_losses: f64,
    /// End-of-day troop level for each simulated day.
    pub troop_curve: Vec<f64>,
}

impl SideReport {
    /// Combat plus non-combat losses.
    #[must_use]
    pub fn total_losses(&self) -> f64 {
        self.combat_losses + self.non_combat_losses
    }
}

/// Result of a finished engagement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementReport {
    /// Verdict.
    pub outcome: Outcome,
    /// Reason the engagement stopped.
    pub termination: Termination,
    /// Index of the last simulated day.
    pub duration: u32,
    /// Attacker figures.
    pub attacker: SideReport,
    /// Defender figures.
    pub defender: SideReport,
}

impl EngagementReport {
    /// Figures for one side.
    #[must_use]
    pub fn side(&self, side: Side) -> &SideReport {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    /// Total attacker losses.
    #[must_use]
    pub fn attacker_losses(&self) -> f64 {
        self.attacker.total_losses()
    }

    /// Total defender losses.
    #[must_use]
    pub fn defender_losses(&self) -> f64 {
        self.defender.total_losses()
    }

    /// Verdict line followed by one line per side.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![self.outcome.to_string()];
        for side in [Side::Attacker, Side::Defender] {
            let report = self.side(side);
            lines.push(format!(
                "The {} side committed {:.0} men, lost {:.0}.",
                side.report_label(),
                report.committed_troops,
                report.total_losses()
            ));
        }
        lines
    }

    /// Serialize the report to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::Serialization(format!("Failed to serialize report: {e}")))
    }

    /// Deserialize a report from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::Serialization(format!("Failed to deserialize report: {e}")))
    }
}

impl fmt::Display for EngagementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary_lines().join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> EngagementReport {
        EngagementReport {
            outcome: Outcome::DefenderDefeated,
            termination: Termination::Threshold,
            duration: 2,
            attacker: SideReport {
                initial_troops: 10000.0,
                committed_troops: 11500.0,
                combat_losses: 900.0,
                non_combat_losses: 50.0,
                troop_curve: vec![9700.0, 11000.0, 10700.0],
            },
            defender: SideReport {
                initial_troops: 8000.0,
                committed_troops: 8000.0,
                combat_losses: 2400.0,
                non_combat_losses: 40.0,
                troop_curve: vec![7200.0, 6400.0, 5600.0],
            },
        }
    }

    #[test]
    fn test_outcome_sides() {
        assert_eq!(Outcome::AttackerDefeated.loser(), Some(Side::Attacker));
        assert_eq!(Outcome::AttackerDefeated.winner(), Some(Side::Defender));
        assert_eq!(Outcome::Draw.loser(), None);
        assert_eq!(Outcome::Draw.winner(), None);
        assert_eq!(Outcome::defeat_of(Side::Defender), Outcome::DefenderDefeated);
    }

    #[test]
    fn test_summary_lines() {
        let lines = sample_report().summary_lines();
        assert_eq!(
            lines,
            vec![
                "Defender lost the battle.".to_string(),
                "The attacking side committed 11500 men, lost 950.".to_string(),
                "The defense side committed 8000 men, lost 2440.".to_string(),
            ]
        );
    }

    #[test]
    fn test_serialization_preserves_report() {
        let report = sample_report();
        let bytes = report.serialize().unwrap();
        let restored = EngagementReport::deserialize(&bytes).unwrap();
        assert_eq!(restored, report);
    }

    #[test]
    fn test_deserialize_garbage_fails() {
        assert!(matches!(
            EngagementReport::deserialize(&[1, 2, 3]),
            Err(GameError::Serialization(_))
        ));
    }
}
