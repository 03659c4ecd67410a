//! Reinforcement marches and the per-day arrival timeline.
//!
//! A reinforcement wave is a division released from elsewhere on the map. It
//! travels as separate regiments and battalions, each at its own pace, so one
//! wave can trickle onto the battlefield over several days. Arrivals on the
//! same day are pooled into a single (troops, strength) entry.

use serde::{Deserialize, Serialize};

use crate::division::DivisionKind;
use crate::error::{GameError, Result};

/// Hours spent marching per day.
pub const MARCHING_HOURS_PER_DAY: f64 = 8.0;

/// Sub-unit archetype spawned by a reinforcing division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegimentArchetype {
    /// Reserve infantry regiment.
    ReserveInfantry,
    /// Mortar battalion.
    Mortar,
    /// Garrison infantry regiment.
    GarrisonInfantry,
    /// Field artillery battalion.
    FieldArtillery,
    /// Field infantry regiment.
    FieldInfantry,
    /// Heavy howitzer regiment.
    HeavyHowitzer,
    /// Anti-tank gun battalion.
    AntiTank,
    /// Armor battalion.
    Armor,
}

impl RegimentArchetype {
    /// Troops per regiment.
    #[must_use]
    pub const fn troops(self) -> u32 {
        match self {
            Self::ReserveInfantry
            | Self::GarrisonInfantry
            | Self::FieldInfantry
            | Self::HeavyHowitzer => 1500,
            Self::Mortar | Self::FieldArtillery | Self::AntiTank | Self::Armor => 800,
        }
    }

    /// Per-soldier strength coefficient.
    #[must_use]
    pub const fn strength(self) -> f64 {
        match self {
            Self::ReserveInfantry => 0.02,
            Self::Mortar => 0.025,
            Self::GarrisonInfantry => 0.023,
            Self::FieldArtillery => 0.03,
            Self::FieldInfantry => 0.025,
            Self::HeavyHowitzer => 0.04,
            Self::AntiTank | Self::Armor => 0.035,
        }
    }

    /// Base march speed, in distance units per hour.
    #[must_use]
    pub const fn base_speed(self) -> f64 {
        match self {
            Self::ReserveInfantry | Self::GarrisonInfantry | Self::FieldInfantry => 4.0,
            Self::Mortar => 3.0,
            Self::FieldArtillery | Self::AntiTank => 2.5,
            Self::HeavyHowitzer => 2.0,
            Self::Armor => 10.0,
        }
    }
}

impl DivisionKind {
    /// Regiments a reinforcing division of this type is split into.
    #[must_use]
    pub const fn regiments(self) -> &'static [RegimentArchetype] {
        use RegimentArchetype as R;
        match self {
            Self::Reserve => &[R::ReserveInfantry, R::Mortar],
            Self::Garrison => &[R::GarrisonInfantry, R::Mortar, R::FieldArtillery],
            Self::Field => &[
                R::FieldInfantry,
                R::Mortar,
                R::FieldArtillery,
                R::HeavyHowitzer,
                R::AntiTank,
                R::Armor,
            ],
        }
    }
}

/// A division marching toward the battlefield.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReinforcementWave {
    /// Parent division type.
    pub division: DivisionKind,
    /// Distance to the battlefield.
    pub distance: f64,
    /// Multiplier on every regiment's base speed (roads, weather, supply).
    pub speed_correction: f64,
}

impl ReinforcementWave {
    /// Create a wave.
    #[must_use]
    pub const fn new(division: DivisionKind, distance: f64, speed_correction: f64) -> Self {
        Self {
            division,
            distance,
            speed_correction,
        }
    }

    fn validate(&self) -> Result<()> {
        let distance_ok = self.distance.is_finite() && self.distance >= 0.0;
        let speed_ok = self.speed_correction.is_finite() && self.speed_correction > 0.0;
        if distance_ok && speed_ok {
            Ok(())
        } else {
            Err(GameError::InvalidReinforcement {
                division: self.division,
                distance: self.distance,
                speed_correction: self.speed_correction,
            })
        }
    }

    /// Resolve this wave into its regiment drafts.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidReinforcement`] for a negative or
    /// non-finite distance, or a non-positive speed correction.
    pub fn drafts(&self) -> Result<Vec<RegimentDraft>> {
        self.validate()?;
        Ok(self
            .division
            .regiments()
            .iter()
            .map(|&archetype| RegimentDraft {
                archetype,
                troops: f64::from(archetype.troops()),
                strength: archetype.strength(),
                arrival_day: arrival_day(
                    self.distance,
                    archetype.base_speed(),
                    self.speed_correction,
                ),
            })
            .collect())
    }
}

/// One regiment en route, with the day it reaches the battlefield.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimentDraft {
    /// Regiment archetype.
    pub archetype: RegimentArchetype,
    /// Troops carried.
    pub troops: f64,
    /// Per-soldier strength.
    pub strength: f64,
    /// Day index on which the regiment joins the fight.
    pub arrival_day: u32,
}

/// Day on which a unit covering `distance` joins the fight.
///
/// ```text
/// ceil(distance / (base_speed × speed_correction × MARCHING_HOURS_PER_DAY))
/// ```
///
/// Inputs are assumed validated: non-negative distance, positive speeds.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn arrival_day(distance: f64, base_speed: f64, speed_correction: f64) -> u32 {
    let days = (distance / (base_speed * speed_correction * MARCHING_HOURS_PER_DAY)).ceil();
    // Saturates on absurd distances; such drafts fall past any horizon anyway.
    days.max(0.0) as u32
}

/// Reinforcements arriving on one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyReinforcement {
    /// Troops arriving.
    pub troops: f64,
    /// Strength factor of the arriving troops.
    pub strength: f64,
}

impl DailyReinforcement {
    /// No arrivals.
    pub const NONE: Self = Self {
        troops: 0.0,
        strength: 0.0,
    };

    /// Create an entry.
    #[must_use]
    pub const fn new(troops: f64, strength: f64) -> Self {
        Self { troops, strength }
    }

    /// Whether nothing arrives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.troops == 0.0
    }
}

/// Per-day reinforcement arrivals for one side, indexed by day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementTimeline {
    days: Vec<DailyReinforcement>,
}

impl EngagementTimeline {
    /// A timeline with no arrivals over `horizon_days`.
    #[must_use]
    pub fn empty(horizon_days: u32) -> Self {
        Self {
            days: vec![DailyReinforcement::NONE; horizon_days as usize],
        }
    }

    /// Build a timeline from explicit per-day entries.
    #[must_use]
    pub fn from_days(days: Vec<DailyReinforcement>) -> Self {
        Self { days }
    }

    /// Number of days covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Whether the timeline covers no day.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Arrivals on `day`, zero past the end.
    #[must_use]
    pub fn day(&self, day: usize) -> DailyReinforcement {
        self.days.get(day).copied().unwrap_or(DailyReinforcement::NONE)
    }

    /// All entries.
    #[must_use]
    pub fn days(&self) -> &[DailyReinforcement] {
        &self.days
    }

    /// Total troops arriving on days `0..=last_day`.
    #[must_use]
    pub fn troops_through(&self, last_day: usize) -> f64 {
        self.days.iter().take(last_day + 1).map(|d| d.troops).sum()
    }

    /// Map every non-empty day's strength through `f`, leaving empty days
    /// as `(0, 0)`.
    #[must_use]
    pub fn map_strength(mut self, f: impl Fn(f64) -> f64) -> Self {
        for day in self.days.iter_mut().filter(|d| !d.is_empty()) {
            day.strength = f(day.strength);
        }
        self
    }
}

/// Pool reinforcement waves into a per-day arrival timeline.
///
/// Each day's strength is the troop-weighted average over the regiments
/// arriving that day. Regiments arriving on or after `horizon_days` are
/// dropped: the engagement is over by then.
///
/// # Errors
///
/// Returns an error if any wave fails validation (see
/// [`ReinforcementWave::drafts`]).
pub fn schedule_reinforcements(
    waves: &[ReinforcementWave],
    horizon_days: u32,
) -> Result<EngagementTimeline> {
    let horizon = horizon_days as usize;
    let mut troops = vec![0.0; horizon];
    let mut weighted = vec![0.0; horizon];

    for wave in waves {
        for draft in wave.drafts()? {
            let day = draft.arrival_day as usize;
            if day >= horizon {
                tracing::trace!(
                    archetype = ?draft.archetype,
                    arrival_day = draft.arrival_day,
                    horizon_days,
                    "Reinforcement arrives after the horizon"
                );
                continue;
            }
            troops[day] += draft.troops;
            weighted[day] += draft.troops * draft.strength;
        }
    }

    let days = troops
        .into_iter()
        .zip(weighted)
        .map(|(troops, weighted)| {
            if troops == 0.0 {
                DailyReinforcement::NONE
            } else {
                DailyReinforcement::new(troops, weighted / troops)
            }
        })
        .collect();

    Ok(EngagementTimeline { days })
}
