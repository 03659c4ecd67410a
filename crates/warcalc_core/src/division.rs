//! Standing divisions and the aggregate force they field.
//!
//! A side's fighting force is described by how many divisions of each type it
//! commits. From that mix we derive the total manpower and a composite
//! per-soldier strength, weighted by manpower.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Standing division type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DivisionKind {
    /// Lightly equipped reserve division.
    Reserve,
    /// Territorial garrison division.
    Garrison,
    /// Fully equipped field division.
    Field,
}

impl DivisionKind {
    /// All division types in canonical order.
    pub const ALL: [Self; 3] = [Self::Reserve, Self::Garrison, Self::Field];

    /// Nominal manpower of one division.
    #[must_use]
    pub const fn manpower(self) -> u32 {
        match self {
            Self::Reserve => 2300,
            Self::Garrison => 3100,
            Self::Field => 6200,
        }
    }

    /// Baseline per-soldier strength coefficient.
    #[must_use]
    pub const fn strength_coefficient(self) -> f64 {
        match self {
            Self::Reserve => 0.0217,
            Self::Garrison => 0.0253,
            Self::Field => 0.0306,
        }
    }
}

/// Number of divisions of each type committed by one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DivisionMix {
    /// Reserve divisions.
    #[serde(default)]
    pub reserve: u32,
    /// Garrison divisions.
    #[serde(default)]
    pub garrison: u32,
    /// Field divisions.
    #[serde(default)]
    pub field: u32,
}

impl DivisionMix {
    /// Create a mix from explicit counts.
    #[must_use]
    pub const fn new(reserve: u32, garrison: u32, field: u32) -> Self {
        Self {
            reserve,
            garrison,
            field,
        }
    }

    /// Count of divisions of the given type.
    #[must_use]
    pub const fn count(&self, kind: DivisionKind) -> u32 {
        match kind {
            DivisionKind::Reserve => self.reserve,
            DivisionKind::Garrison => self.garrison,
            DivisionKind::Field => self.field,
        }
    }

    /// Whether no division is committed at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.reserve == 0 && self.garrison == 0 && self.field == 0
    }
}

/// Aggregate manpower and quality of a division mix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceState {
    /// Total manpower.
    pub troop: f64,
    /// Manpower-weighted average per-soldier strength.
    pub strength: f64,
}

/// Derive the aggregate force of a division mix.
///
/// ```text
/// troop    = Σ count × manpower
/// strength = Σ (coefficient × manpower × count) / troop
/// ```
///
/// # Errors
///
/// Returns [`GameError::EmptyDivisionMix`] when no division is committed,
/// since the weighted average is undefined over zero manpower.
pub fn derive_force(mix: &DivisionMix) -> Result<ForceState> {
    if mix.is_empty() {
        return Err(GameError::EmptyDivisionMix);
    }

    let mut troop = 0.0;
    let mut weighted = 0.0;
    for kind in DivisionKind::ALL {
        let manpower = f64::from(kind.manpower()) * f64::from(mix.count(kind));
        troop += manpower;
        weighted += kind.strength_coefficient() * manpower;
    }

    Ok(ForceState {
        troop,
        strength: weighted / troop,
    })
}
