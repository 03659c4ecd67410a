//! Combat modifiers: terrain, role, experience, morale and buffs.
//!
//! The lookup tables are exhaustive matches over closed enums so that adding
//! a terrain or tier forces every table to be revisited.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Base loss tolerance before morale and buffs.
pub const BASE_LOSS_THRESHOLD: f64 = 0.3;

/// Base non-combat attrition fraction before morale and buffs.
pub const BASE_NON_COMBAT_ATTRITION: f64 = 0.005;

/// Terrain on which the engagement is fought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    /// Rolling hills.
    Hilly,
    /// High mountains.
    Mountain,
    /// Dense forest.
    Forest,
    /// Marsh and swamp.
    Swamp,
    /// Open desert.
    Desert,
    /// Urban terrain.
    City,
    /// Prepared fortifications.
    Fortress,
}

impl Terrain {
    /// All terrain types.
    pub const ALL: [Self; 7] = [
        Self::Hilly,
        Self::Mountain,
        Self::Forest,
        Self::Swamp,
        Self::Desert,
        Self::City,
        Self::Fortress,
    ];

    /// Signed topography adjustment for a side fighting in the given role.
    ///
    /// Swamp and desert hurt both roles; everything else favours the defender.
    #[must_use]
    pub const fn modifier(self, role: Role) -> f64 {
        match (self, role) {
            (Self::Hilly, Role::Attack) => 0.0,
            (Self::Mountain, Role::Attack) => -0.2,
            (Self::Forest, Role::Attack) => -0.15,
            (Self::Swamp, Role::Attack) => -0.3,
            (Self::Desert, Role::Attack) => -0.15,
            (Self::City, Role::Attack) => -0.1,
            (Self::Fortress, Role::Attack) => -0.05,

            (Self::Hilly, Role::Defence) => 0.1,
            (Self::Mountain, Role::Defence) => 0.25,
            (Self::Forest, Role::Defence) => 0.2,
            (Self::Swamp, Role::Defence) => -0.3,
            (Self::Desert, Role::Defence) => -0.2,
            (Self::City, Role::Defence) => 0.15,
            (Self::Fortress, Role::Defence) => 0.05,
        }
    }
}

/// Combat role of a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Attacking into the terrain.
    Attack,
    /// Defending the terrain.
    Defence,
}

/// Soldier experience tier, 1 (green) through 5 (elite).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Experience {
    /// Tier 1.
    Green,
    /// Tier 2.
    Trained,
    /// Tier 3.
    Regular,
    /// Tier 4.
    Veteran,
    /// Tier 5.
    Elite,
}

impl Experience {
    /// Numeric tier (1..=5).
    #[must_use]
    pub const fn tier(self) -> u8 {
        match self {
            Self::Green => 1,
            Self::Trained => 2,
            Self::Regular => 3,
            Self::Veteran => 4,
            Self::Elite => 5,
        }
    }

    /// Multiplicative adjustment applied as `(1 + modifier)`.
    #[must_use]
    pub const fn modifier(self) -> f64 {
        match self {
            Self::Green => -0.05,
            Self::Trained => 0.0,
            Self::Regular => 0.01,
            Self::Veteran => 0.025,
            Self::Elite => 0.05,
        }
    }
}

impl TryFrom<u8> for Experience {
    type Error = GameError;

    fn try_from(tier: u8) -> Result<Self> {
        match tier {
            1 => Ok(Self::Green),
            2 => Ok(Self::Trained),
            3 => Ok(Self::Regular),
            4 => Ok(Self::Veteran),
            5 => Ok(Self::Elite),
            other => Err(GameError::InvalidExperience(other)),
        }
    }
}

impl From<Experience> for u8 {
    fn from(experience: Experience) -> Self {
        experience.tier()
    }
}

/// Externally supplied multiplicative buff (supply, air power, tactics,
/// national traits...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buff {
    /// Free-form label, only used in diagnostics.
    pub name: String,
    /// Multiplicative factor.
    pub factor: f64,
}

impl Buff {
    /// Create a named buff.
    #[must_use]
    pub fn new(name: impl Into<String>, factor: f64) -> Self {
        Self {
            name: name.into(),
            factor,
        }
    }
}

/// Everything that bends a side's raw strength in a given engagement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatModifiers {
    /// Terrain of the engagement.
    pub terrain: Terrain,
    /// Role of this side.
    pub role: Role,
    /// Experience tier.
    pub experience: Experience,
    /// Morale index, nominally 0.8 to 1.2.
    pub morale: f64,
    /// Whether this side is encircled.
    #[serde(default)]
    pub surrounded: bool,
    /// Buffs, multiplied in the order given.
    #[serde(default)]
    pub buffs: Vec<Buff>,
}

impl CombatModifiers {
    /// Create modifiers with neutral morale, no encirclement and no buffs.
    #[must_use]
    pub fn new(terrain: Terrain, role: Role, experience: Experience) -> Self {
        Self {
            terrain,
            role,
            experience,
            morale: 1.0,
            surrounded: false,
            buffs: Vec::new(),
        }
    }

    /// Builder method to set morale.
    #[must_use]
    pub fn with_morale(mut self, morale: f64) -> Self {
        self.morale = morale;
        self
    }

    /// Builder method to mark the side as surrounded.
    #[must_use]
    pub fn with_surrounded(mut self, surrounded: bool) -> Self {
        self.surrounded = surrounded;
        self
    }

    /// Builder method to append a buff.
    #[must_use]
    pub fn with_buff(mut self, name: impl Into<String>, factor: f64) -> Self {
        self.buffs.push(Buff::new(name, factor));
        self
    }

    /// Topography adjustment for this side's terrain and role.
    #[must_use]
    pub fn topography_modifier(&self) -> f64 {
        self.terrain.modifier(self.role)
    }

    /// Product of all buffs (1 when none are supplied).
    #[must_use]
    pub fn buff_product(&self) -> f64 {
        self.buffs.iter().fold(1.0, |acc, buff| acc * buff.factor)
    }

    /// Check morale and buffs.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidMorale`] for non-positive or non-finite
    /// morale and [`GameError::InvalidBuff`] for non-finite buff factors.
    pub fn validate(&self) -> Result<()> {
        if !self.morale.is_finite() || self.morale <= 0.0 {
            return Err(GameError::InvalidMorale(self.morale));
        }
        if let Some(buff) = self.buffs.iter().find(|b| !b.factor.is_finite()) {
            return Err(GameError::InvalidBuff {
                name: buff.name.clone(),
                factor: buff.factor,
            });
        }
        Ok(())
    }

    /// Effective combat factor of a raw strength under these modifiers.
    ///
    /// ```text
    /// strength^morale × (1 + topography) × (1 + experience) × buffs
    /// ```
    ///
    /// Callers are expected to have validated the modifiers.
    #[must_use]
    pub fn apply(&self, strength: f64) -> f64 {
        strength.powf(self.morale)
            * (1.0 + self.topography_modifier())
            * (1.0 + self.experience.modifier())
            * self.buff_product()
    }
}

/// Combat factor, loss tolerance and non-combat attrition of one side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModifierFactor {
    /// Per-day attrition the side inflicts, per soldier committed.
    pub combat_factor: f64,
    /// Cumulative loss ratio above which the side breaks.
    pub attrition_threshold: f64,
    /// One-off non-combat loss fraction of initial troops.
    pub non_combat_attrition: f64,
}

/// Derive a side's modifier factors from its raw strength.
///
/// The loss threshold is scaled by `(1 + topography)` only when the side is
/// surrounded.
///
/// # Errors
///
/// Returns an error if the modifiers fail [`CombatModifiers::validate`].
pub fn derive_modifier_factor(strength: f64, modifiers: &CombatModifiers) -> Result<ModifierFactor> {
    modifiers.validate()?;

    let buffs = modifiers.buff_product();
    let combat_factor = modifiers.apply(strength);

    let mut attrition_threshold = BASE_LOSS_THRESHOLD.powf(modifiers.morale) * buffs;
    if modifiers.surrounded {
        attrition_threshold *= 1.0 + modifiers.topography_modifier();
    }

    let non_combat_attrition = BASE_NON_COMBAT_ATTRITION.powf(modifiers.morale) * buffs;

    Ok(ModifierFactor {
        combat_factor,
        attrition_threshold,
        non_combat_attrition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_terrain_table_shape() {
        for terrain in Terrain::ALL {
            assert!(
                terrain.modifier(Role::Attack) <= 0.0,
                "{terrain:?} should never help the attacker"
            );
        }
        // Swamp and desert punish both roles
        assert!(Terrain::Swamp.modifier(Role::Defence) < 0.0);
        assert!(Terrain::Desert.modifier(Role::Defence) < 0.0);
        // Mountain is the best defensive ground
        assert_eq!(Terrain::Mountain.modifier(Role::Defence), 0.25);
    }

    #[test]
    fn test_experience_roundtrip_and_rejection() {
        for tier in 1..=5u8 {
            let experience = Experience::try_from(tier).unwrap();
            assert_eq!(u8::from(experience), tier);
        }
        assert_eq!(
            Experience::try_from(0).unwrap_err(),
            GameError::InvalidExperience(0)
        );
        assert_eq!(
            Experience::try_from(6).unwrap_err(),
            GameError::InvalidExperience(6)
        );
    }

    #[test]
    fn test_experience_deserializes_from_tier_number() {
        let experience: Experience = ron::from_str("4").unwrap();
        assert_eq!(experience, Experience::Veteran);
        assert!(ron::from_str::<Experience>("9").is_err());
    }

    #[test]
    fn test_buff_product_defaults_to_one() {
        let mods = CombatModifiers::new(Terrain::Hilly, Role::Attack, Experience::Trained);
        assert_eq!(mods.buff_product(), 1.0);

        let mods = mods.with_buff("supply", 1.2).with_buff("air_power", 0.8);
        assert!((mods.buff_product() - 0.96).abs() < EPS);
    }

    #[test]
    fn test_neutral_modifiers_keep_strength() {
        let mods = CombatModifiers::new(Terrain::Hilly, Role::Attack, Experience::Trained);
        let factor = derive_modifier_factor(0.025, &mods).unwrap();

        assert!((factor.combat_factor - 0.025).abs() < EPS);
        assert!((factor.attrition_threshold - 0.3).abs() < EPS);
        assert!((factor.non_combat_attrition - 0.005).abs() < EPS);
    }

    #[test]
    fn test_combat_factor_formula() {
        let mods = CombatModifiers::new(Terrain::Mountain, Role::Defence, Experience::Elite)
            .with_morale(1.1)
            .with_buff("tactic", 1.05);
        let factor = derive_modifier_factor(0.025, &mods).unwrap();

        let expected = 0.025f64.powf(1.1) * 1.25 * 1.05 * 1.05;
        assert!((factor.combat_factor - expected).abs() < EPS);
        assert!((factor.attrition_threshold - 0.3f64.powf(1.1) * 1.05).abs() < EPS);
        assert!((factor.non_combat_attrition - 0.005f64.powf(1.1) * 1.05).abs() < EPS);
    }

    #[test]
    fn test_surrounded_scales_threshold_by_terrain() {
        let open = CombatModifiers::new(Terrain::Swamp, Role::Defence, Experience::Trained);
        let encircled = open.clone().with_surrounded(true);

        let open = derive_modifier_factor(0.02, &open).unwrap();
        let encircled = derive_modifier_factor(0.02, &encircled).unwrap();

        assert!((encircled.attrition_threshold - open.attrition_threshold * 0.7).abs() < EPS);
        // Combat factor is unaffected by encirclement
        assert_eq!(encircled.combat_factor, open.combat_factor);
    }

    #[test]
    fn test_invalid_morale_rejected() {
        for morale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mods = CombatModifiers::new(Terrain::City, Role::Attack, Experience::Regular)
                .with_morale(morale);
            assert!(matches!(
                derive_modifier_factor(0.02, &mods),
                Err(GameError::InvalidMorale(_))
            ));
        }
    }

    #[test]
    fn test_non_finite_buff_rejected() {
        let mods = CombatModifiers::new(Terrain::City, Role::Attack, Experience::Regular)
            .with_buff("air_power", f64::NAN);
        let err = derive_modifier_factor(0.02, &mods).unwrap_err();
        assert!(matches!(err, GameError::InvalidBuff { ref name, .. } if name == "air_power"));
    }
}
