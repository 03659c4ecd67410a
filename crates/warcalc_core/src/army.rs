//! A side's full military description and its reduction to simulator inputs.

use serde::{Deserialize, Serialize};

use crate::division::{derive_force, DivisionKind, DivisionMix, ForceState};
use crate::error::Result;
use crate::modifiers::{
    derive_modifier_factor, CombatModifiers, Experience, ModifierFactor, Role, Terrain,
};
use crate::reinforcement::{schedule_reinforcements, EngagementTimeline, ReinforcementWave};

/// Divisions on the field, reinforcements on the march, and the conditions
/// the side fights under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Army {
    /// Divisions present when the engagement starts.
    pub divisions: DivisionMix,
    /// Divisions marching toward the battlefield.
    #[serde(default)]
    pub reinforcements: Vec<ReinforcementWave>,
    /// Combat modifiers for this side.
    pub modifiers: CombatModifiers,
}

/// Initial troops plus the side's modifier factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmyCorrection {
    /// Raw force on the field.
    pub force: ForceState,
    /// Combat factor, loss threshold and non-combat attrition.
    pub factor: ModifierFactor,
}

impl Army {
    /// Create an army with no reinforcements.
    #[must_use]
    pub fn new(divisions: DivisionMix, modifiers: CombatModifiers) -> Self {
        Self {
            divisions,
            reinforcements: Vec::new(),
            modifiers,
        }
    }

    /// Builder method to add a reinforcement wave.
    #[must_use]
    pub fn with_reinforcement(mut self, wave: ReinforcementWave) -> Self {
        self.reinforcements.push(wave);
        self
    }

    /// Mixed corps attacking through hills under four buffs, with four
    /// waves on the march.
    #[must_use]
    pub fn hill_assault() -> Self {
        Self::new(
            DivisionMix::new(3, 4, 3),
            CombatModifiers::new(Terrain::Hilly, Role::Attack, Experience::Trained)
                .with_buff("supply", 1.2)
                .with_buff("air_power", 0.8)
                .with_buff("tactic", 1.05)
                .with_buff("national_specificities", 1.25),
        )
        .with_reinforcement(ReinforcementWave::new(DivisionKind::Reserve, 200.0, 0.7))
        .with_reinforcement(ReinforcementWave::new(DivisionKind::Reserve, 100.0, 0.8))
        .with_reinforcement(ReinforcementWave::new(DivisionKind::Garrison, 50.0, 0.9))
        .with_reinforcement(ReinforcementWave::new(DivisionKind::Field, 300.0, 0.8))
    }

    /// Garrison holding the hills against [`Army::hill_assault`], with one
    /// field division on the way.
    #[must_use]
    pub fn hill_garrison() -> Self {
        Self::new(
            DivisionMix::new(2, 5, 1),
            CombatModifiers::new(Terrain::Hilly, Role::Defence, Experience::Regular)
                .with_morale(1.1)
                .with_buff("supply", 1.1),
        )
        .with_reinforcement(ReinforcementWave::new(DivisionKind::Field, 120.0, 1.0))
    }

    /// Initial troops and modifier factors for this side.
    ///
    /// # Errors
    ///
    /// Fails on an empty division mix or invalid modifiers.
    pub fn correction(&self) -> Result<ArmyCorrection> {
        let force = derive_force(&self.divisions)?;
        let factor = derive_modifier_factor(force.strength, &self.modifiers)?;
        Ok(ArmyCorrection { force, factor })
    }

    /// Reinforcement timeline with each day's strength passed through this
    /// side's modifiers, ready to reweight the attrition rate on arrival.
    ///
    /// # Errors
    ///
    /// Fails on invalid modifiers or reinforcement waves.
    pub fn support(&self, horizon_days: u32) -> Result<EngagementTimeline> {
        self.modifiers.validate()?;
        let timeline = schedule_reinforcements(&self.reinforcements, horizon_days)?;
        Ok(timeline.map_strength(|strength| self.modifiers.apply(strength)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;

    #[test]
    fn test_correction() {
        let army = Army::hill_assault();
        let correction = army.correction().unwrap();

        assert_eq!(correction.force.troop, 37900.0);
        let buffs = 1.2 * 0.8 * 1.05 * 1.25;
        assert!((correction.factor.combat_factor - correction.force.strength * buffs).abs() < 1e-12);
        assert!((correction.factor.attrition_threshold - 0.3 * buffs).abs() < 1e-12);
    }

    #[test]
    fn test_support_applies_modifiers_to_arrivals() {
        let army = Army::hill_assault();
        let raw = schedule_reinforcements(&army.reinforcements, 30).unwrap();
        let support = army.support(30).unwrap();

        assert_eq!(support.len(), 30);
        for (raw_day, day) in raw.days().iter().zip(support.days()) {
            assert_eq!(raw_day.troops, day.troops);
            if raw_day.is_empty() {
                assert_eq!(day.strength, 0.0);
            } else {
                assert!((day.strength - army.modifiers.apply(raw_day.strength)).abs() < 1e-15);
            }
        }
        // Garrison infantry at 50 / (4 × 0.9 × 8) → day 2
        assert!(support.day(2).troops >= 1500.0);
    }

    #[test]
    fn test_empty_army_rejected() {
        let army = Army::new(
            DivisionMix::default(),
            CombatModifiers::new(Terrain::City, Role::Defence, Experience::Regular),
        );
        assert_eq!(army.correction().unwrap_err(), GameError::EmptyDivisionMix);
    }

    #[test]
    fn test_hill_armies_fight_in_their_roles() {
        let assault = Army::hill_assault();
        let garrison = Army::hill_garrison();

        assert_eq!(assault.modifiers.role, Role::Attack);
        assert_eq!(garrison.modifiers.role, Role::Defence);
        assert_eq!(garrison.correction().unwrap().force.troop, 26300.0);
        assert_eq!(garrison.reinforcements.len(), 1);
    }
}
